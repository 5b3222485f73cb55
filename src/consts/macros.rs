/// Define a bitflags type that serializes as its underlying integer.
///
/// Bits that have no named flag are retained when deserializing so
/// that a value read from the wire can be written back unchanged.
///
/// # Usage
///
/// ```
/// genl_netdev::impl_flags!(
///     /// Flags for a fake netlink protocol
///     pub MyFlags: u32 {
///         FIRST = 1 << 0;
///         SECOND = 1 << 1;
///     }
/// );
/// ```
#[macro_export]
macro_rules! impl_flags {
    (
        $(#[$outer:meta])*
        $vis:vis $name:ident: $bin_type:ty {
            $(
                $(#[$inner:ident $($args:tt)*])*
                $var:ident = $const:expr;
            )*
        }
    ) => {
        $crate::__bitflags::bitflags! {
            $(#[$outer])*
            #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
            $vis struct $name: $bin_type {
                $(
                    $(#[$inner $($args)*])*
                    const $var = $const;
                )*
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::empty()
            }
        }

        impl $crate::Size for $name {
            fn unpadded_size(&self) -> usize {
                std::mem::size_of::<$bin_type>()
            }
        }

        impl $crate::TypeSize for $name {
            fn type_size() -> usize {
                std::mem::size_of::<$bin_type>()
            }
        }

        impl $crate::ToBytes for $name {
            fn to_bytes(
                &self,
                buffer: &mut std::io::Cursor<Vec<u8>>,
            ) -> Result<(), $crate::err::SerError> {
                $crate::ToBytes::to_bytes(&self.bits(), buffer)
            }
        }

        impl<'lt> $crate::FromBytes<'lt> for $name {
            fn from_bytes(
                buffer: &mut std::io::Cursor<&'lt [u8]>,
            ) -> Result<Self, $crate::err::DeError> {
                Ok($name::from_bits_retain(
                    <$bin_type as $crate::FromBytes>::from_bytes(buffer)?,
                ))
            }
        }
    };
}

/// Declare a marker trait for constants that are valid in a given
/// position of a message and implement it for the integer type and
/// every listed constant enum.
macro_rules! impl_trait {
    (
        $(#[$outer:meta])*
        $vis_trait:vis $trait_name:ident,
        $to_from_ty:ty,
        $( $const_enum:ident ),+
    ) => {
        $(#[$outer])*
        $vis_trait trait $trait_name:
            PartialEq
            + Clone
            + Copy
            + std::fmt::Debug
            + From<$to_from_ty>
            + Into<$to_from_ty>
            + $crate::Size
            + $crate::TypeSize
            + $crate::ToBytes
            + for<'lt> $crate::FromBytes<'lt>
        {}

        impl $trait_name for $to_from_ty {}

        $(
            impl $trait_name for $const_enum {}
        )+
    };
}
