// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A small declarative bitflag generator used by the API flag types.

/// Declares a transparent bitflag newtype with set operations and a readable `Debug`.
#[macro_export]
#[doc(hidden)]
macro_rules! strata_bitflags {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident: $ty:ty {
            $(
                $(#[$flag_attr:meta])*
                const $flag_name:ident = $flag_value:expr;
            )*
        }
    ) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis struct $name {
            bits: $ty,
        }

        impl $name {
            /// No flags set.
            pub const EMPTY: Self = Self { bits: 0 };

            $(
                $(#[$flag_attr])*
                pub const $flag_name: Self = Self { bits: $flag_value };
            )*

            /// Builds a set from raw bits, keeping unknown bits.
            pub const fn from_bits_retain(bits: $ty) -> Self {
                Self { bits }
            }

            /// Raw bit value.
            pub const fn bits(&self) -> $ty {
                self.bits
            }

            /// `true` when no bit is set.
            pub const fn is_empty(&self) -> bool {
                self.bits == 0
            }

            /// `true` when every flag of `other` is set in `self`.
            pub const fn contains(&self, other: Self) -> bool {
                (self.bits & other.bits) == other.bits
            }

            /// `true` when `self` and `other` share at least one flag.
            pub const fn intersects(&self, other: Self) -> bool {
                (self.bits & other.bits) != 0
            }

            /// Sets the flags of `other`.
            pub fn insert(&mut self, other: Self) {
                self.bits |= other.bits;
            }

            /// Clears the flags of `other`.
            pub fn remove(&mut self, other: Self) {
                self.bits &= !other.bits;
            }
        }

        impl core::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, other: Self) -> Self {
                Self { bits: self.bits | other.bits }
            }
        }

        impl core::ops::BitAnd for $name {
            type Output = Self;
            fn bitand(self, other: Self) -> Self {
                Self { bits: self.bits & other.bits }
            }
        }

        impl core::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, other: Self) {
                self.bits |= other.bits;
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                let mut remaining = self.bits;
                let mut wrote = false;
                write!(f, "{}(", stringify!($name))?;
                $(
                    if $flag_value != 0 && (remaining & $flag_value) == $flag_value {
                        if wrote {
                            write!(f, " | ")?;
                        }
                        write!(f, "{}", stringify!($flag_name))?;
                        remaining &= !$flag_value;
                        wrote = true;
                    }
                )*
                if remaining != 0 {
                    if wrote {
                        write!(f, " | ")?;
                    }
                    write!(f, "{remaining:#x}")?;
                } else if !wrote {
                    write!(f, "EMPTY")?;
                }
                write!(f, ")")
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::strata_bitflags;

    strata_bitflags! {
        /// Flags used only by these tests.
        pub struct Probe: u32 {
            const A = 1 << 0;
            const B = 1 << 1;
            const C = 1 << 2;
        }
    }

    #[test]
    fn empty_set_debug_and_queries() {
        let flags = Probe::default();
        assert!(flags.is_empty());
        assert!(flags.contains(Probe::EMPTY));
        assert!(!flags.intersects(Probe::A));
        assert_eq!(format!("{flags:?}"), "Probe(EMPTY)");
    }

    #[test]
    fn union_and_removal() {
        let mut flags = Probe::A | Probe::C;
        assert!(flags.contains(Probe::A));
        assert!(!flags.contains(Probe::B));
        assert_eq!(format!("{flags:?}"), "Probe(A | C)");

        flags.remove(Probe::A);
        flags.insert(Probe::B);
        assert_eq!(flags, Probe::B | Probe::C);
        assert_eq!((flags & Probe::B).bits(), 2);
    }

    #[test]
    fn unknown_bits_are_kept() {
        let flags = Probe::from_bits_retain(0b1_0001);
        assert_eq!(flags.bits(), 17);
        assert_eq!(format!("{flags:?}"), "Probe(A | 0x10)");
    }
}
