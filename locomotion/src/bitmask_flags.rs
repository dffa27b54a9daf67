//! Query channel sets packed into one integer.
//!
//! A collision body lists the channels it blocks; a sweep or trace names the
//! one channel it runs on and only sees bodies whose mask has that bit.

use num_traits::{One, PrimInt};

/// A channel enum declared with [`define_bitmask_flags!`]. Each variant owns
/// the bit at its discriminant.
pub trait FlagBitmask: Copy {
    type Storage: PrimInt;

    fn bit_index(self) -> u8;

    fn mask(self) -> Self::Storage {
        Self::Storage::one() << usize::from(self.bit_index())
    }
}

/// Channels blocked by one body.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct BitmaskFlags<T: PrimInt> {
    bits: T,
}

impl<T: PrimInt> BitmaskFlags<T> {
    /// Blocks every channel, the usual mask for level geometry.
    pub fn all() -> Self {
        Self { bits: !T::zero() }
    }

    pub fn from_tags<U: FlagBitmask<Storage = T>>(tags: &[U]) -> Self {
        let bits = tags.iter().fold(T::zero(), |bits, tag| bits | tag.mask());
        Self { bits }
    }

    /// Whether a query on `channel` hits a body carrying this mask.
    pub fn has<U: FlagBitmask<Storage = T>>(&self, channel: U) -> bool {
        (self.bits & channel.mask()) != T::zero()
    }
}

/// Declare a channel enum and its bit layout.
///
/// Variants deserialize by name, so config files can pick a query channel.
#[macro_export]
macro_rules! define_bitmask_flags {
    ($name:ident, $storage:ty, { $($variant:ident),* $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Deserialize)]
        #[repr(u8)]
        pub enum $name {
            $($variant),*
        }

        impl $crate::bitmask_flags::FlagBitmask for $name {
            type Storage = $storage;

            fn bit_index(self) -> u8 {
                self as u8
            }
        }
    };
}
