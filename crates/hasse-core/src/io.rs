//! Line-oriented text format for implicational systems, plus the
//! extension-keyed format registry used by [`ImplicationalSystem::save`] and
//! [`ImplicationalSystem::parse`].
//!
//! The format is round-trippable:
//!
//! ```text
//! a b c d e
//! a b -> c d
//! c d -> e
//! ```
//!
//! The first line declares the ground set. Every following line is one rule,
//! premise tokens before the `->`, conclusion tokens after. Rule tokens that
//! were not declared on the first line are dropped silently, and a rule whose
//! conclusion ends up empty is not added.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use logos::Logos;

use crate::element::Element;
use crate::error::{ParseError, SaveError};
use crate::rule::Rule;
use crate::system::ImplicationalSystem;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\f]+")]
enum Token<'src> {
    #[token("->", priority = 3)]
    Arrow,
    #[regex(r"[^ \t\r\n\f]+", |lex| lex.slice(), priority = 1)]
    Word(&'src str),
}

/// Read a system from any buffered reader.
pub fn read_from<E, R>(reader: R) -> Result<ImplicationalSystem<E>, ParseError>
where
    E: Element + FromStr,
    R: BufRead,
{
    let mut system = ImplicationalSystem::new();
    let mut lines = reader.lines();

    let first = lines.next().ok_or(ParseError::MissingGroundSet)??;
    for token in first.split_whitespace() {
        match token.parse::<E>() {
            Ok(e) => {
                system.add_element(e);
            }
            Err(_) => {
                return Err(ParseError::BadToken {
                    token: token.to_string(),
                    line: 1,
                })
            }
        }
    }

    for (number, line) in lines.enumerate() {
        let line = line?;
        let line_number = number + 2;
        if line.trim().is_empty() {
            continue;
        }
        let mut premise = Vec::new();
        let mut conclusion = Vec::new();
        let mut seen_arrow = false;
        for token in Token::lexer(&line) {
            match token {
                Ok(Token::Arrow) => {
                    if seen_arrow {
                        return Err(ParseError::MalformedRule {
                            line: line_number,
                            message: "duplicate '->'".into(),
                        });
                    }
                    seen_arrow = true;
                }
                Ok(Token::Word(word)) => {
                    if let Ok(e) = word.parse::<E>() {
                        if system.ground_set().contains(&e) {
                            if seen_arrow {
                                conclusion.push(e);
                            } else {
                                premise.push(e);
                            }
                        }
                    }
                }
                Err(()) => {
                    return Err(ParseError::MalformedRule {
                        line: line_number,
                        message: "unreadable token".into(),
                    })
                }
            }
        }
        if !seen_arrow {
            return Err(ParseError::MalformedRule {
                line: line_number,
                message: "missing '->'".into(),
            });
        }
        if conclusion.is_empty() {
            continue;
        }
        system.add_rule(Rule::new(premise, conclusion));
    }
    Ok(system)
}

/// Write a system to any writer, in the line-oriented format.
pub fn write_to<E, W>(system: &ImplicationalSystem<E>, writer: &mut W) -> Result<(), SaveError>
where
    E: Element + Display,
    W: Write + ?Sized,
{
    write!(writer, "{system}")?;
    Ok(())
}

/// One registered format: a reader and a writer.
pub struct Format<E: Element> {
    pub read: fn(&mut dyn BufRead) -> Result<ImplicationalSystem<E>, ParseError>,
    pub write: fn(&ImplicationalSystem<E>, &mut dyn Write) -> Result<(), SaveError>,
}

impl<E: Element> Clone for Format<E> {
    fn clone(&self) -> Self {
        Self {
            read: self.read,
            write: self.write,
        }
    }
}

/// Extension-keyed registry of readers and writers.
///
/// Passed explicitly to [`ImplicationalSystem::save_with`] and
/// [`ImplicationalSystem::parse_with`]; the `save`/`parse` conveniences use
/// the default registry, which knows the `txt` format.
pub struct IoRegistry<E: Element> {
    formats: BTreeMap<String, Format<E>>,
}

impl<E: Element> IoRegistry<E> {
    /// A registry with no formats at all.
    pub fn empty() -> Self {
        Self {
            formats: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, extension: impl Into<String>, format: Format<E>) {
        self.formats.insert(extension.into(), format);
    }

    pub fn get(&self, extension: &str) -> Option<&Format<E>> {
        self.formats.get(extension)
    }
}

fn read_txt<E: Element + FromStr>(
    reader: &mut dyn BufRead,
) -> Result<ImplicationalSystem<E>, ParseError> {
    read_from(reader)
}

fn write_txt<E: Element + Display>(
    system: &ImplicationalSystem<E>,
    writer: &mut dyn Write,
) -> Result<(), SaveError> {
    write_to(system, writer)
}

impl<E: Element + Display + FromStr> Default for IoRegistry<E> {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(
            "txt",
            Format {
                read: read_txt::<E>,
                write: write_txt::<E>,
            },
        );
        registry
    }
}

fn extension_of(path: &Path) -> Option<&str> {
    path.extension()?.to_str()
}

impl<E: Element> ImplicationalSystem<E> {
    /// Save through the given registry, selecting the format by the file
    /// extension.
    pub fn save_with(
        &self,
        registry: &IoRegistry<E>,
        path: impl AsRef<Path>,
    ) -> Result<(), SaveError> {
        let path = path.as_ref();
        let extension = extension_of(path)
            .ok_or_else(|| SaveError::MissingExtension(path.display().to_string()))?;
        let format = registry
            .get(extension)
            .ok_or_else(|| SaveError::UnknownExtension(extension.to_string()))?;
        let mut writer = BufWriter::new(File::create(path)?);
        (format.write)(self, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Parse through the given registry, selecting the format by the file
    /// extension.
    pub fn parse_with(
        registry: &IoRegistry<E>,
        path: impl AsRef<Path>,
    ) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let extension = extension_of(path)
            .ok_or_else(|| ParseError::MissingExtension(path.display().to_string()))?;
        let format = registry
            .get(extension)
            .ok_or_else(|| ParseError::UnknownExtension(extension.to_string()))?;
        let mut reader = BufReader::new(File::open(path)?);
        (format.read)(&mut reader)
    }
}

impl<E: Element + Display + FromStr> ImplicationalSystem<E> {
    /// Save with the default registry.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SaveError> {
        self.save_with(&IoRegistry::default(), path)
    }

    /// Parse with the default registry.
    pub fn parse(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        Self::parse_with(&IoRegistry::default(), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse_str(text: &str) -> Result<ImplicationalSystem<String>, ParseError> {
        read_from(Cursor::new(text.as_bytes()))
    }

    #[test]
    fn parses_the_documented_example() {
        let system = parse_str("a b c d e\na b -> c d\nc d -> e\n").unwrap();
        assert_eq!(system.size_elements(), 5);
        assert_eq!(system.size_rules(), 2);
        let x: std::collections::BTreeSet<String> = ["a".into(), "b".into()].into();
        assert_eq!(system.closure(&x).len(), 5);
    }

    #[test]
    fn round_trips_structurally() {
        let system = parse_str("a b c d e\na b -> c d\nc d -> e\n").unwrap();
        let mut buffer = Vec::new();
        write_to(&system, &mut buffer).unwrap();
        let again = read_from(Cursor::new(buffer.as_slice())).unwrap();
        assert_eq!(system, again);
    }

    #[test]
    fn undeclared_rule_tokens_are_dropped() {
        let system = parse_str("a b\na z -> b\n").unwrap();
        assert_eq!(system.size_rules(), 1);
        let rule = system.rules().iter().next().unwrap();
        assert_eq!(rule.premise().len(), 1);
        assert!(rule.premise().contains("a"));
    }

    #[test]
    fn emptied_conclusions_skip_the_rule() {
        let system = parse_str("a b\na -> z\n").unwrap();
        assert_eq!(system.size_rules(), 0);
    }

    #[test]
    fn blank_lines_are_ignored() {
        let system = parse_str("a b\n\na -> b\n").unwrap();
        assert_eq!(system.size_rules(), 1);
    }

    #[test]
    fn missing_arrow_is_malformed() {
        let error = parse_str("a b\na b\n").unwrap_err();
        assert!(matches!(
            error,
            ParseError::MalformedRule { line: 2, .. }
        ));
    }

    #[test]
    fn empty_input_is_missing_ground_set() {
        assert!(matches!(parse_str(""), Err(ParseError::MissingGroundSet)));
    }

    #[test]
    fn registry_rejects_unknown_extensions() {
        let registry: IoRegistry<String> = IoRegistry::empty();
        let system: ImplicationalSystem<String> = ImplicationalSystem::new();
        let error = system
            .save_with(&registry, "system.txt")
            .unwrap_err();
        assert!(matches!(error, SaveError::UnknownExtension(ext) if ext == "txt"));
    }

    #[test]
    fn missing_extension_is_reported() {
        let system: ImplicationalSystem<String> = ImplicationalSystem::new();
        let error = system.save("system").unwrap_err();
        assert!(matches!(error, SaveError::MissingExtension(_)));
    }

    #[test]
    fn save_and_parse_through_files() {
        let path = std::env::temp_dir().join("hasse-io-roundtrip.txt");
        let system = parse_str("a b c\na -> b\nb -> c\n").unwrap();
        system.save(&path).unwrap();
        let again = ImplicationalSystem::<String>::parse(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(system, again);
    }
}
