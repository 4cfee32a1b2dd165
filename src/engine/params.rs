//! Named lab parameters with declared ranges.

use std::fmt;

use crate::error::{LabError, Result};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    Flag(bool),
    Choice(&'static str),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{}", trim_number(*v)),
            Value::Flag(true) => write!(f, "on"),
            Value::Flag(false) => write!(f, "off"),
            Value::Choice(tag) => write!(f, "{}", tag),
        }
    }
}

fn trim_number(v: f64) -> String {
    if v.fract().abs() < 1e-9 {
        format!("{:.0}", v)
    } else if (v * 10.0).fract().abs() < 1e-9 {
        format!("{:.1}", v)
    } else {
        format!("{:.2}", v)
    }
}

#[derive(Clone, Debug)]
pub enum ParamKind {
    Number { min: f64, max: f64, step: f64 },
    Flag,
    Choice { options: &'static [&'static str] },
}

impl ParamKind {
    fn expected(&self) -> &'static str {
        match self {
            ParamKind::Number { .. } => "number",
            ParamKind::Flag => "flag",
            ParamKind::Choice { .. } => "choice",
        }
    }
}

/// Declaration of one control: slider, checkbox or dropdown.
#[derive(Clone, Debug)]
pub struct ParamSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub unit: &'static str,
    pub kind: ParamKind,
    pub default: Value,
}

impl ParamSpec {
    pub fn number(
        name: &'static str,
        label: &'static str,
        unit: &'static str,
        (min, max, step): (f64, f64, f64),
        default: f64,
    ) -> Self {
        Self {
            name,
            label,
            unit,
            kind: ParamKind::Number { min, max, step },
            default: Value::Number(default),
        }
    }

    pub fn flag(name: &'static str, label: &'static str, default: bool) -> Self {
        Self {
            name,
            label,
            unit: "",
            kind: ParamKind::Flag,
            default: Value::Flag(default),
        }
    }

    pub fn choice(
        name: &'static str,
        label: &'static str,
        options: &'static [&'static str],
        default: &'static str,
    ) -> Self {
        Self {
            name,
            label,
            unit: "",
            kind: ParamKind::Choice { options },
            default: Value::Choice(default),
        }
    }

    /// Validates `value` against this declaration, clamping numbers into range.
    fn admit(&self, value: Value) -> Result<Value> {
        match (&self.kind, value) {
            (ParamKind::Number { min, max, .. }, Value::Number(v)) => {
                if !v.is_finite() {
                    return Err(LabError::NonFinite(self.name.to_string()));
                }
                Ok(Value::Number(v.clamp(*min, *max)))
            }
            (ParamKind::Flag, Value::Flag(b)) => Ok(Value::Flag(b)),
            (ParamKind::Choice { options }, Value::Choice(tag)) => options
                .iter()
                .find(|o| **o == tag)
                .map(|o| Value::Choice(*o))
                .ok_or_else(|| LabError::InvalidChoice {
                    name: self.name.to_string(),
                    value: tag.to_string(),
                }),
            (kind, _) => Err(LabError::KindMismatch {
                name: self.name.to_string(),
                expected: kind.expected(),
            }),
        }
    }

    /// Position of `value` within the slider range, 0.0..=1.0.
    pub fn fraction(&self, value: Value) -> f64 {
        match (&self.kind, value) {
            (ParamKind::Number { min, max, .. }, Value::Number(v)) if max > min => {
                ((v - min) / (max - min)).clamp(0.0, 1.0)
            }
            (ParamKind::Flag, Value::Flag(b)) => if b { 1.0 } else { 0.0 },
            (ParamKind::Choice { options }, Value::Choice(tag)) if options.len() > 1 => {
                let idx = options.iter().position(|o| *o == tag).unwrap_or(0);
                idx as f64 / (options.len() - 1) as f64
            }
            _ => 0.0,
        }
    }
}

#[derive(Clone, Debug)]
struct Entry {
    spec: ParamSpec,
    value: Value,
}

/// The flat parameter set owned by one lab.
///
/// `revision` only moves when a stored value actually changes; the render
/// tick compares it against the revision it last drew to repaint while paused.
#[derive(Clone, Debug)]
pub struct ParameterStore {
    entries: Vec<Entry>,
    revision: u64,
}

impl ParameterStore {
    pub fn new(specs: Vec<ParamSpec>) -> Result<Self> {
        let mut entries: Vec<Entry> = Vec::with_capacity(specs.len());
        for spec in specs {
            if entries.iter().any(|e| e.spec.name == spec.name) {
                return Err(LabError::DuplicateParameter(spec.name.to_string()));
            }
            let value = spec.admit(spec.default)?;
            entries.push(Entry { spec, value });
        }
        Ok(Self { entries, revision: 0 })
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.entries
            .iter()
            .position(|e| e.spec.name == name)
            .ok_or_else(|| LabError::UnknownParameter(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Result<Value> {
        Ok(self.entries[self.index_of(name)?].value)
    }

    /// Stores `value`, clamping numbers into the declared range.
    /// Returns whether the stored value changed.
    pub fn set(&mut self, name: &str, value: Value) -> Result<bool> {
        let idx = self.index_of(name)?;
        let next = self.entries[idx].spec.admit(value)?;
        if self.entries[idx].value == next {
            return Ok(false);
        }
        self.entries[idx].value = next;
        self.revision += 1;
        Ok(true)
    }

    /// Moves a control by whole steps: numbers by their declared step,
    /// choices cycle, flags flip.
    pub fn nudge(&mut self, name: &str, steps: i32) -> Result<bool> {
        if steps == 0 {
            return Ok(false);
        }
        let idx = self.index_of(name)?;
        let entry = &self.entries[idx];
        let next = match (&entry.spec.kind, entry.value) {
            (ParamKind::Number { min, step, .. }, Value::Number(v)) => {
                let raw = v + step * steps as f64;
                // Snap to the step grid so repeated nudges don't drift.
                let snapped = min + ((raw - min) / step).round() * step;
                Value::Number(snapped)
            }
            (ParamKind::Flag, Value::Flag(b)) => Value::Flag(!b),
            (ParamKind::Choice { options }, Value::Choice(tag)) => {
                let len = options.len() as i32;
                let current = options.iter().position(|o| *o == tag).unwrap_or(0) as i32;
                Value::Choice(options[(current + steps).rem_euclid(len) as usize])
            }
            (kind, _) => {
                return Err(LabError::KindMismatch {
                    name: name.to_string(),
                    expected: kind.expected(),
                })
            }
        };
        self.set(name, next)
    }

    pub fn number(&self, name: &str) -> Result<f64> {
        match self.get(name)? {
            Value::Number(v) => Ok(v),
            _ => Err(LabError::KindMismatch { name: name.to_string(), expected: "number" }),
        }
    }

    pub fn flag(&self, name: &str) -> Result<bool> {
        match self.get(name)? {
            Value::Flag(b) => Ok(b),
            _ => Err(LabError::KindMismatch { name: name.to_string(), expected: "flag" }),
        }
    }

    pub fn choice(&self, name: &str) -> Result<&'static str> {
        match self.get(name)? {
            Value::Choice(tag) => Ok(tag),
            _ => Err(LabError::KindMismatch { name: name.to_string(), expected: "choice" }),
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Declarations and current values, in declaration order.
    pub fn controls(&self) -> impl Iterator<Item = (&ParamSpec, Value)> {
        self.entries.iter().map(|e| (&e.spec, e.value))
    }

    pub fn name_at(&self, idx: usize) -> Option<&'static str> {
        self.entries.get(idx).map(|e| e.spec.name)
    }
}
