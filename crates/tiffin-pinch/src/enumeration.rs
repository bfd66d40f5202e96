//! Enumeration support.
//!
//! Thrift enumerations travel as `i32` values. [`pinch_enum!`] declares a
//! fieldless Rust enum together with its wire-tag table in both directions
//! and a [`Pinchable`](crate::Pinchable) implementation; decoding a tag
//! outside the declared set yields
//! [`PinchError::UnknownEnum`](crate::PinchError::UnknownEnum).

/// Declare an enumeration with explicit wire tags.
///
/// ```
/// use tiffin_pinch::{Pinchable, pinch_enum};
///
/// pinch_enum! {
///     /// Arithmetic operation selector.
///     pub enum CalcOp {
///         /// Addition
///         Plus = 1,
///         /// Subtraction
///         Minus = 2,
///         /// Division
///         Div = 3,
///     }
/// }
///
/// assert_eq!(CalcOp::Minus.wire_tag(), 2);
/// assert_eq!(CalcOp::from_wire_tag(3), Some(CalcOp::Div));
/// assert_eq!(CalcOp::unpinch(&CalcOp::Plus.pinch()), Ok(CalcOp::Plus));
/// ```
#[macro_export]
macro_rules! pinch_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident = $tag:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),+
        }

        impl $name {
            /// The i32 this variant uses on the wire.
            #[must_use]
            $vis const fn wire_tag(self) -> i32 {
                match self {
                    $(Self::$variant => $tag),+
                }
            }

            /// Look up a variant by wire tag.
            #[must_use]
            $vis fn from_wire_tag(tag: i32) -> ::core::option::Option<Self> {
                match tag {
                    $($tag => ::core::option::Option::Some(Self::$variant),)+
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl $crate::Pinchable for $name {
            const TTYPE: $crate::TType = $crate::TType::I32;

            fn pinch(&self) -> $crate::Value {
                $crate::Value::I32(self.wire_tag())
            }

            fn unpinch(
                value: &$crate::Value,
            ) -> ::core::result::Result<Self, $crate::PinchError> {
                let tag = <i32 as $crate::Pinchable>::unpinch(value)?;
                Self::from_wire_tag(tag).ok_or($crate::PinchError::UnknownEnum {
                    enumeration: ::core::stringify!($name),
                    value: tag,
                })
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::errors::PinchError;
    use crate::pinchable::Pinchable;

    pinch_enum! {
        /// Weekday sample.
        enum Day {
            /// Monday
            Mon = 1,
            /// Friday
            Fri = 5,
        }
    }

    #[test]
    fn tags_round_trip() {
        assert_eq!(Day::Mon.wire_tag(), 1);
        assert_eq!(Day::from_wire_tag(5), Some(Day::Fri));
        assert_eq!(Day::from_wire_tag(2), None);
        assert_eq!(Day::unpinch(&Day::Fri.pinch()).unwrap(), Day::Fri);
    }

    #[test]
    fn unknown_tag_is_rejected_by_name() {
        let err = Day::unpinch(&crate::Value::I32(9)).unwrap_err();
        assert_eq!(err, PinchError::UnknownEnum { enumeration: "Day", value: 9 });
    }

    #[test]
    fn wrong_tag_type_is_rejected_before_lookup() {
        assert!(matches!(
            Day::unpinch(&crate::Value::I64(1)),
            Err(PinchError::UnexpectedType { .. })
        ));
    }
}
