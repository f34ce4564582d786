//! Raw text to typed parameter values.

use oasis_core::{OasError, ParamKind, ParamValue, TypedParameter};

/// Converts the raw text of a parameter to its declared kind.
///
/// An empty `raw` means the parameter is absent and yields `Ok(None)`;
/// whether it was required is decided later by schema validation.
/// `String` never fails. The other kinds use the standard textual parsing
/// of `i64`, `f64` and `bool`; a failure names the parameter, the raw text
/// and the expected kind. Non-finite floats are rejected since they have
/// no JSON representation.
///
/// # Example
///
/// ```rust
/// use oasis_core::{ParamKind, ParamLocation, ParamValue, TypedParameter};
/// use oasis_extract::convert;
/// use serde_json::Value;
///
/// let limit = TypedParameter::new(ParamLocation::Query, "limit", "", false, Value::Null, ParamKind::Integer);
/// assert_eq!(convert(&limit, "42").unwrap(), Some(ParamValue::Integer(42)));
/// assert_eq!(convert(&limit, "").unwrap(), None);
/// assert!(convert(&limit, "abc").is_err());
/// ```
pub fn convert(param: &TypedParameter, raw: &str) -> Result<Option<ParamValue>, OasError> {
    if raw.is_empty() {
        return Ok(None);
    }

    let value = match param.kind {
        ParamKind::String => Some(ParamValue::String(raw.to_string())),
        ParamKind::Integer => raw.parse::<i64>().ok().map(ParamValue::Integer),
        ParamKind::Float => raw
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(ParamValue::Float),
        ParamKind::Boolean => raw.parse::<bool>().ok().map(ParamValue::Boolean),
    };

    value
        .map(Some)
        .ok_or_else(|| OasError::parameter_type(param.location, &param.name, raw, param.kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use oasis_core::ParamLocation;
    use proptest::prelude::*;
    use serde_json::Value;

    fn param(kind: ParamKind) -> TypedParameter {
        TypedParameter::new(ParamLocation::Query, "limit", "", false, Value::Null, kind)
    }

    #[test]
    fn test_integer_conversion() {
        assert_eq!(
            convert(&param(ParamKind::Integer), "42").unwrap(),
            Some(ParamValue::Integer(42))
        );
        assert_eq!(
            convert(&param(ParamKind::Integer), "-7").unwrap(),
            Some(ParamValue::Integer(-7))
        );
    }

    #[test]
    fn test_integer_failure_names_parameter() {
        let err = convert(&param(ParamKind::Integer), "abc").unwrap_err();
        match &err {
            OasError::ParameterType {
                location,
                name,
                raw,
                expected,
            } => {
                assert_eq!(*location, ParamLocation::Query);
                assert_eq!(name, "limit");
                assert_eq!(raw, "abc");
                assert_eq!(*expected, ParamKind::Integer);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("int"));
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_float_and_bool() {
        assert_eq!(
            convert(&param(ParamKind::Float), "1.5").unwrap(),
            Some(ParamValue::Float(1.5))
        );
        assert!(convert(&param(ParamKind::Float), "NaN").is_err());
        assert!(convert(&param(ParamKind::Float), "inf").is_err());
        assert_eq!(
            convert(&param(ParamKind::Boolean), "true").unwrap(),
            Some(ParamValue::Boolean(true))
        );
        assert!(convert(&param(ParamKind::Boolean), "yes").is_err());
    }

    #[test]
    fn test_empty_is_absent() {
        for kind in [
            ParamKind::String,
            ParamKind::Integer,
            ParamKind::Float,
            ParamKind::Boolean,
        ] {
            assert_eq!(convert(&param(kind), "").unwrap(), None);
        }
    }

    proptest! {
        #[test]
        fn integers_round_trip(n in any::<i64>()) {
            let value = convert(&param(ParamKind::Integer), &n.to_string()).unwrap();
            prop_assert_eq!(value, Some(ParamValue::Integer(n)));
        }

        #[test]
        fn strings_never_fail(s in ".*") {
            let value = convert(&param(ParamKind::String), &s).unwrap();
            if s.is_empty() {
                prop_assert_eq!(value, None);
            } else {
                prop_assert_eq!(value, Some(ParamValue::String(s)));
            }
        }

        #[test]
        fn arbitrary_text_never_panics(s in ".*") {
            for kind in [ParamKind::Integer, ParamKind::Float, ParamKind::Boolean] {
                let _ = convert(&param(kind), &s);
            }
        }
    }
}
