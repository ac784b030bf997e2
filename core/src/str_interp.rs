//! `#{var}` string templates used for compile/run commands.
//!
//! `##` is a literal `#`, and a `#` not followed by `{` is kept as is.

use std::{borrow::Borrow, collections::HashMap, ffi::OsStr, fmt, hash::Hash};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InterpError {
    #[error("Undefined variable '{0}' at {}", .1+1)]
    UndefinedVar(String, usize),

    #[error("Unclosed brace (found open brace at {})", .0+1)]
    UnclosedBrace(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    /// Variable name and the char position of its `{`.
    Var(String, usize),
}

/// A parsed template. Syntax errors are reported by [`Template::parse`],
/// undefined variables by [`Template::render`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(try_from = "String")]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(fmt: &str) -> Result<Self, InterpError> {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut chars = fmt.chars().enumerate().peekable();

        while let Some((_, c)) = chars.next() {
            if c != '#' {
                text.push(c);
                continue;
            }
            match chars.peek() {
                Some((_, '#')) => {
                    chars.next();
                    text.push('#');
                }
                Some(&(brace_pos, '{')) => {
                    chars.next();
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(InterpError::UnclosedBrace(brace_pos));
                    }
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(Segment::Var(name, brace_pos));
                }
                _ => text.push('#'),
            }
        }
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        Ok(Self {
            source: fmt.to_owned(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn render<K, V>(&self, variables: &HashMap<K, V>) -> Result<String, InterpError>
    where
        K: Borrow<str> + Hash + Eq,
        V: AsRef<OsStr>,
    {
        let mut res = String::with_capacity(self.source.len() * 2);
        for segment in &self.segments {
            match segment {
                Segment::Text(s) => res.push_str(s),
                Segment::Var(name, pos) => {
                    let Some(value) = variables.get(name.as_str()) else {
                        return Err(InterpError::UndefinedVar(name.clone(), pos + 1));
                    };
                    res += value.as_ref().to_string_lossy().as_ref();
                }
            }
        }
        Ok(res)
    }
}

impl TryFrom<String> for Template {
    type Error = InterpError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use maplit::hashmap;

    fn interp(fmt: &str, vars: &HashMap<&str, &str>) -> Result<String, InterpError> {
        Template::parse(fmt)?.render(vars)
    }

    #[test]
    fn interp_ok() {
        let vars = hashmap! {
            "filePath" => "src/main.cpp",
            "fileStem" => "main",
            "exePath" => "/tmp/jdg_x/test.bin",
            "_#%!?" => "wooo",
        };

        assert_eq!(interp("g++", &vars).unwrap(), "g++");
        assert_eq!(interp("#{filePath}", &vars).unwrap(), vars["filePath"]);
        assert_eq!(interp("#{_#%!?}", &vars).unwrap(), vars["_#%!?"]);
        assert_eq!(
            interp("g++ #{filePath} -o #{exePath}", &vars).unwrap(),
            "g++ src/main.cpp -o /tmp/jdg_x/test.bin"
        );
        assert_eq!(interp("#{fileStem}#{fileStem}", &vars).unwrap(), "mainmain");
        assert_eq!(interp("abc {fileStem} xyz", &vars).unwrap(), "abc {fileStem} xyz");
        assert_eq!(interp("abc # {fileStem}", &vars).unwrap(), "abc # {fileStem}");
        assert_eq!(interp("abc #fileStem", &vars).unwrap(), "abc #fileStem");
        assert_eq!(interp("abc ##{fileStem}", &vars).unwrap(), "abc #{fileStem}");
        assert_eq!(interp("abc ## xyz", &vars).unwrap(), "abc # xyz");
        assert_eq!(interp("#", &vars).unwrap(), "#");
        assert_eq!(interp("##", &vars).unwrap(), "#");
        assert_eq!(interp("###", &vars).unwrap(), "##");
    }

    #[test]
    fn interp_ng() {
        let vars = hashmap! { "age" => "999" };
        assert_eq!(
            interp("#{firstName} #{lastName}", &vars).unwrap_err(),
            InterpError::UndefinedVar("firstName".to_owned(), 2)
        );
        assert_eq!(
            interp("#{age} #{hello", &vars).unwrap_err(),
            InterpError::UnclosedBrace(8),
        );
    }

    #[test]
    fn template_displays_its_source() {
        let t = Template::parse("#{exePath} < #{fileDir}/in ## #{exePath}").unwrap();
        assert_eq!(t.to_string(), "#{exePath} < #{fileDir}/in ## #{exePath}");
        assert_eq!(t.as_str(), t.to_string());
    }
}
