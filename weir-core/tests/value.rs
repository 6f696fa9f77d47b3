#[cfg(test)]
mod tests {
    use std::cmp::Ordering;
    use time::{Date, Month, PrimitiveDateTime, Time};
    use uuid::Uuid;
    use weir_core::{AsValue, Value, ValueKey, distinct_keys, temporal_to_string};

    #[test]
    fn value_none() {
        assert_eq!(Value::Null, Value::Null);
        assert_ne!(Value::Float32(Some(1.0)), Value::Null);
        assert_eq!(Value::Int32(None), Value::Int32(None));
        assert_ne!(Value::Int32(None), Value::Int64(None));
        assert!(Value::Varchar(None).is_null());
        assert!(!Value::Varchar(Some("".into())).is_null());
    }

    #[test]
    fn value_bool() {
        let val: Value = true.into();
        assert_eq!(val, Value::Boolean(Some(true)));
        assert_ne!(val, Value::Boolean(Some(false)));
        assert_ne!(val, Value::Varchar(Some("true".into())));
        let var: bool = AsValue::try_from_value(val).unwrap();
        assert!(var);
        assert!(bool::try_from_value(1i8.into()).unwrap());
        assert!(!bool::try_from_value(0i64.into()).unwrap());
        assert!(bool::try_from_value("true".into()).unwrap());
        assert!(!bool::try_from_value("0".into()).unwrap());
        assert!(bool::try_from_value(0.5f32.into()).is_err());
    }

    #[test]
    fn value_integers() {
        let val: Value = 127i8.into();
        assert_eq!(val, Value::Int8(Some(127)));
        assert_eq!(i64::try_from_value(val).unwrap(), 127);
        assert_eq!(i16::try_from_value(99u8.into()).unwrap(), 99);
        assert_eq!(u32::try_from_value(Value::Int64(Some(5000))).unwrap(), 5000);
        assert_eq!(i32::try_from_value(Value::Float64(Some(12.0))).unwrap(), 12);
        assert_eq!(i64::try_from_value(" 42 ".into()).unwrap(), 42);
        assert!(i8::try_from_value(300i32.into()).is_err());
        assert!(u8::try_from_value((-1i32).into()).is_err());
        assert!(i8::try_from_value(0.1f64.into()).is_err());
        assert!(i32::try_from_value("forty two".into()).is_err());
    }

    #[test]
    fn value_floats() {
        let val: Value = 1.5f64.into();
        assert_eq!(val, Value::Float64(Some(1.5)));
        assert_eq!(f32::try_from_value(val).unwrap(), 1.5);
        assert_eq!(f64::try_from_value(3i32.into()).unwrap(), 3.0);
        assert_eq!(f64::try_from_value("2.25".into()).unwrap(), 2.25);
    }

    #[test]
    fn value_text_and_blob() {
        let val: Value = "hello".into();
        assert_eq!(val, Value::Varchar(Some("hello".into())));
        assert_eq!(String::try_from_value(val).unwrap(), "hello");
        let val: Value = vec![1u8, 2, 3].into();
        assert_eq!(val, Value::Blob(Some([1u8, 2, 3].into())));
        assert_eq!(Vec::<u8>::try_from_value(val).unwrap(), vec![1, 2, 3]);
        assert!(String::try_from_value(5i32.into()).is_err());
    }

    #[test]
    fn value_option() {
        let val: Value = Some(4i64).into();
        assert_eq!(val, Value::Int64(Some(4)));
        let val: Value = None::<i64>.into();
        assert_eq!(val, Value::Int64(None));
        assert_eq!(Option::<i64>::try_from_value(Value::Null).unwrap(), None);
        assert_eq!(
            Option::<i64>::try_from_value(Value::Int32(Some(9))).unwrap(),
            Some(9)
        );
        assert!(i64::try_from_value(Value::Int64(None)).is_err());
        assert!(<Option<i64> as AsValue>::NULLABLE);
        assert!(!<i64 as AsValue>::NULLABLE);
    }

    #[test]
    fn value_temporal() {
        let date = Date::from_calendar_date(2025, Month::March, 9).unwrap();
        let time = Time::from_hms_micro(13, 5, 59, 120).unwrap();
        let timestamp = PrimitiveDateTime::new(date, time);
        assert_eq!(
            temporal_to_string(&Value::Date(Some(date))).unwrap(),
            "2025-03-09"
        );
        assert_eq!(
            temporal_to_string(&Value::Timestamp(Some(timestamp))).unwrap(),
            "2025-03-09 13:05:59.000120"
        );
        assert_eq!(Date::try_from_value("2025-03-09".into()).unwrap(), date);
        assert_eq!(Time::try_from_value("13:05:59.000120".into()).unwrap(), time);
        assert_eq!(
            Time::try_from_value("13:05".into()).unwrap(),
            Time::from_hms(13, 5, 0).unwrap()
        );
        assert_eq!(
            PrimitiveDateTime::try_from_value("2025-03-09 13:05:59.000120".into()).unwrap(),
            timestamp
        );
        assert_eq!(
            PrimitiveDateTime::try_from_value("2025-03-09 13:05:59".into()).unwrap(),
            PrimitiveDateTime::new(date, Time::from_hms(13, 5, 59).unwrap())
        );
        assert!(Date::try_from_value("yesterday".into()).is_err());
    }

    #[test]
    fn value_uuid() {
        let id = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        let val: Value = id.into();
        assert_eq!(val, Value::Uuid(Some(id)));
        assert_eq!(
            Uuid::try_from_value("67e55044-10b1-426f-9247-bb680e5fe0c8".into()).unwrap(),
            id
        );
        assert_eq!(
            String::try_from_value(val).unwrap(),
            "67e55044-10b1-426f-9247-bb680e5fe0c8"
        );
    }

    #[test]
    fn value_keys() {
        assert_eq!(Value::Int32(Some(7)).key(), Value::Int64(Some(7)).key());
        assert_eq!(Value::Float64(Some(7.0)).key(), ValueKey::Integer(7));
        assert_ne!(Value::Int32(Some(7)).key(), Value::Varchar(Some("7".into())).key());
        assert_eq!(
            distinct_keys([
                Value::Int64(Some(3)),
                Value::Int64(None),
                Value::Int32(Some(1)),
                Value::Int64(Some(3)),
                Value::Null,
                Value::UInt8(Some(1)),
            ]),
            vec![Value::Int64(Some(3)), Value::Int32(Some(1))]
        );
    }

    #[test]
    fn value_compare() {
        assert_eq!(
            Value::Int8(Some(3)).compare(&Value::Int64(Some(10))),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::Float32(Some(2.5)).compare(&Value::Int32(Some(2))),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Value::Varchar(Some("b".into())).compare(&Value::Varchar(Some("a".into()))),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::Int8(None).compare(&Value::Int8(Some(1))), None);
        assert_eq!(
            Value::Varchar(Some("1".into())).compare(&Value::Int8(Some(1))),
            None
        );
        assert!(Value::Int16(Some(4)).matches(&Value::UInt64(Some(4))));
        assert!(!Value::Null.matches(&Value::Null));
    }
}
