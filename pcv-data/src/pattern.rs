//! Line templates.
//!
//! A template such as `"{?},{x},{y},{z}"` describes where the fields of a point
//! sit on one line of text. [`Pattern::compile`] turns it into an anchored
//! regular expression once; [`Pattern::parse`] then runs it on every line of
//! the source.
//!
//! Recognized tokens:
//! - `{x}`, `{y}`, `{z}`: coordinates (signed decimal), required
//! - `{r}`, `{g}`, `{b}`: color channels (unsigned integer, 0-255)
//! - `{id}`: class id (signed integer)
//! - `{X}`, `{Y}`, `{Z}`: secondary offset added to the coordinates, all or none
//! - `{?}`: any text, ignored
//!
//! Everything else in the template is matched literally.

use crate::error::{ParseError, PatternError};
use crate::types::Point;
use regex::{Captures, Regex};
use std::str::FromStr;
use tracing::debug;

const DECIMAL: &str = r"[-+]?[0-9]*\.?[0-9]+(?:[eE][-+]?[0-9]+)?";
const UNSIGNED: &str = r"[0-9]+";
const SIGNED: &str = r"[-+]?[0-9]+";
const WILDCARD: &str = r".+?";

/// Named fields a template can capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    X,
    Y,
    Z,
    R,
    G,
    B,
    Id,
    OffsetX,
    OffsetY,
    OffsetZ,
}

impl Field {
    const ALL: [Field; 10] = [
        Field::X,
        Field::Y,
        Field::Z,
        Field::R,
        Field::G,
        Field::B,
        Field::Id,
        Field::OffsetX,
        Field::OffsetY,
        Field::OffsetZ,
    ];

    fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == token)
    }

    /// Token name, also used as the capture group name.
    fn name(self) -> &'static str {
        match self {
            Field::X => "x",
            Field::Y => "y",
            Field::Z => "z",
            Field::R => "r",
            Field::G => "g",
            Field::B => "b",
            Field::Id => "id",
            Field::OffsetX => "X",
            Field::OffsetY => "Y",
            Field::OffsetZ => "Z",
        }
    }

    fn expression(self) -> &'static str {
        match self {
            Field::R | Field::G | Field::B => UNSIGNED,
            Field::Id => SIGNED,
            _ => DECIMAL,
        }
    }

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// A compiled line template, reusable across every line of a source.
#[derive(Debug, Clone)]
pub struct Pattern {
    template: String,
    regex: Regex,
    fields: u16,
    wildcards: usize,
}

impl Pattern {
    /// Compile a template into a line matcher.
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        debug!("Received pattern template: {}", template);

        let mut expression = String::from("^");
        let mut fields = 0u16;
        let mut wildcards = 0usize;
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            let Some(close) = rest[open..].find('}').map(|i| open + i) else {
                break;
            };
            let token = &rest[open + 1..close];

            if token == "?" {
                expression.push_str(&regex::escape(&rest[..open]));
                expression.push_str(&format!("(?P<ignore{wildcards}>{WILDCARD})"));
                wildcards += 1;
            } else if let Some(field) = Field::from_token(token) {
                if fields & field.bit() != 0 {
                    return Err(PatternError::DuplicateField {
                        template: template.to_string(),
                        field: field.name(),
                    });
                }
                fields |= field.bit();
                expression.push_str(&regex::escape(&rest[..open]));
                expression.push_str(&format!("(?P<{}>{})", field.name(), field.expression()));
            } else {
                // Unknown token: keep the opening brace as literal text and rescan after it.
                expression.push_str(&regex::escape(&rest[..=open]));
                rest = &rest[open + 1..];
                continue;
            }
            rest = &rest[close + 1..];
        }
        expression.push_str(&regex::escape(rest));
        expression.push('$');

        for field in [Field::X, Field::Y, Field::Z] {
            if fields & field.bit() == 0 {
                return Err(PatternError::MissingField {
                    template: template.to_string(),
                    field: field.name(),
                });
            }
        }

        let regex = Regex::new(&expression).map_err(|source| PatternError::Regex {
            template: template.to_string(),
            source,
        })?;
        debug!("Compiled pattern: {}", regex.as_str());

        Ok(Self {
            template: template.to_string(),
            regex,
            fields,
            wildcards,
        })
    }

    /// The template this pattern was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Number of `{?}` wildcards in the template.
    pub fn wildcard_count(&self) -> usize {
        self.wildcards
    }

    fn has(&self, field: Field) -> bool {
        self.fields & field.bit() != 0
    }

    /// Parse one line into a point.
    ///
    /// Trailing line terminators are ignored; the rest of the line must match
    /// the template entirely.
    pub fn parse(&self, line: &str) -> Result<Point, ParseError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let caps = self.regex.captures(line).ok_or(ParseError::NoMatch)?;

        let mut x: f64 = required(&caps, Field::X)?;
        let mut y: f64 = required(&caps, Field::Y)?;
        let mut z: f64 = required(&caps, Field::Z)?;

        let secondary = [Field::OffsetX, Field::OffsetY, Field::OffsetZ];
        match secondary.iter().filter(|f| self.has(**f)).count() {
            0 => {}
            3 => {
                x += required::<f64>(&caps, Field::OffsetX)?;
                y += required::<f64>(&caps, Field::OffsetY)?;
                z += required::<f64>(&caps, Field::OffsetZ)?;
            }
            _ => return Err(ParseError::SecondaryOffsetIncomplete),
        }

        Ok(Point {
            x,
            y,
            z,
            r: optional(&caps, Field::R)?,
            g: optional(&caps, Field::G)?,
            b: optional(&caps, Field::B)?,
            class_id: optional(&caps, Field::Id)?,
        })
    }
}

impl FromStr for Pattern {
    type Err = PatternError;

    fn from_str(template: &str) -> Result<Self, Self::Err> {
        Self::compile(template)
    }
}

fn optional<T: FromStr>(caps: &Captures<'_>, field: Field) -> Result<Option<T>, ParseError> {
    caps.name(field.name())
        .map(|m| {
            m.as_str().parse::<T>().map_err(|_| ParseError::InvalidNumber {
                field: field.name(),
                value: m.as_str().to_string(),
            })
        })
        .transpose()
}

fn required<T: FromStr>(caps: &Captures<'_>, field: Field) -> Result<T, ParseError> {
    optional(caps, field)?.ok_or(ParseError::MissingCoordinate(field.name()))
}
