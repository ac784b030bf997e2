pub use self::glob::GlobPattern;
pub use self::seconds::Seconds;

pub mod glob {
    use std::ops::Deref;

    use ::glob::PatternError;
    use ::serde::{
        de::{self, Visitor},
        Deserialize, Serialize,
    };

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct GlobPattern(::glob::Pattern);

    impl GlobPattern {
        pub fn parse(pattern: &str) -> Result<Self, PatternError> {
            ::glob::Pattern::new(pattern).map(Self)
        }
    }

    impl Deref for GlobPattern {
        type Target = ::glob::Pattern;

        fn deref(&self) -> &Self::Target {
            &self.0
        }
    }

    impl Serialize for GlobPattern {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            serializer.serialize_str(self.0.as_str())
        }
    }

    impl<'de> Deserialize<'de> for GlobPattern {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            struct GlobPatternVisitor;

            impl<'de> Visitor<'de> for GlobPatternVisitor {
                type Value = GlobPattern;

                fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                    write!(f, "a glob pattern string")
                }

                fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
                where
                    E: de::Error,
                {
                    Self::Value::parse(v).map_err(de::Error::custom)
                }
            }

            deserializer.deserialize_str(GlobPatternVisitor)
        }
    }

}

pub mod seconds {
    use std::{fmt, time::Duration};

    use ::serde::{
        de::{self, Visitor},
        Deserialize, Serialize,
    };

    /// Non-negative duration written as a number of seconds (`1`, `0.5`, `60.0`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    pub struct Seconds(pub Duration);

    impl From<Seconds> for Duration {
        fn from(value: Seconds) -> Self {
            value.0
        }
    }

    impl Serialize for Seconds {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            serializer.serialize_f64(self.0.as_secs_f64())
        }
    }

    impl<'de> Deserialize<'de> for Seconds {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            struct SecondsVisitor;

            impl<'de> Visitor<'de> for SecondsVisitor {
                type Value = Seconds;

                fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                    write!(f, "a non-negative number of seconds")
                }

                fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
                where
                    E: de::Error,
                {
                    Duration::try_from_secs_f64(v)
                        .map(Seconds)
                        .map_err(de::Error::custom)
                }

                fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
                where
                    E: de::Error,
                {
                    u64::try_from(v)
                        .map(|v| Seconds(Duration::from_secs(v)))
                        .map_err(de::Error::custom)
                }

                fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
                where
                    E: de::Error,
                {
                    Ok(Seconds(Duration::from_secs(v)))
                }
            }

            deserializer.deserialize_any(SecondsVisitor)
        }
    }

    #[cfg(test)]
    mod test {
        use super::*;

        #[derive(Debug, Deserialize)]
        struct Limit {
            tle: Seconds,
        }

        #[test]
        fn deserialize_seconds_ok() {
            let l: Limit = toml::from_str("tle = 60").unwrap();
            assert_eq!(l.tle.0, Duration::from_secs(60));

            let l: Limit = toml::from_str("tle = 0.25").unwrap();
            assert_eq!(l.tle.0, Duration::from_millis(250));
        }

        #[test]
        fn deserialize_seconds_ng() {
            assert!(toml::from_str::<Limit>("tle = -1").is_err());
            assert!(toml::from_str::<Limit>("tle = -0.5").is_err());
            assert!(toml::from_str::<Limit>(r#"tle = "1s""#).is_err());
        }
    }
}
