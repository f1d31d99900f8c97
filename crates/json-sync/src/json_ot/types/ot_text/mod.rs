//! Reversible character deltas over strings.
//!
//! A `TextDelta` is a sequence of components walked over the source text:
//! - `Retain(n)`: keep `n` characters
//! - `Insert(s)`: insert `s`
//! - `Delete(n)`: drop `n` characters
//!
//! Lengths count `char`s. Characters past the last component are retained.
//! Wire form: `[{"retain": 2}, {"insert": "x"}, {"delete": 1}]`.

mod handler;

pub use handler::{decode, encode, TextHandler};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextComponent {
    Retain(usize),
    Insert(String),
    Delete(usize),
}

pub type TextDelta = Vec<TextComponent>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TextError {
    #[error("delta spans {needed} characters but the text has {len}")]
    TooShort { len: usize, needed: usize },
    #[error("malformed delta: {0}")]
    Malformed(String),
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Append a component, merging with the last one when of the same type.
fn append(delta: &mut TextDelta, comp: TextComponent) {
    match (delta.last_mut(), &comp) {
        (_, TextComponent::Retain(0) | TextComponent::Delete(0)) => return,
        (_, TextComponent::Insert(s)) if s.is_empty() => return,
        (Some(TextComponent::Retain(n)), TextComponent::Retain(m)) => { *n += m; return; }
        (Some(TextComponent::Delete(n)), TextComponent::Delete(m)) => { *n += m; return; }
        (Some(TextComponent::Insert(s)), TextComponent::Insert(t)) => { s.push_str(t); return; }
        _ => {}
    }
    delta.push(comp);
}

/// Coalesce adjacent components of the same type, drop empty ones and the
/// trailing retain.
pub fn normalize(delta: TextDelta) -> TextDelta {
    let mut out = TextDelta::with_capacity(delta.len());
    for comp in delta {
        append(&mut out, comp);
    }
    if matches!(out.last(), Some(TextComponent::Retain(_))) {
        out.pop();
    }
    out
}

/// Apply `delta` to `text`.
pub fn apply(text: &str, delta: &[TextComponent]) -> Result<String, TextError> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut idx = 0usize;
    for comp in delta {
        match comp {
            TextComponent::Retain(n) | TextComponent::Delete(n) => {
                let end = idx + n;
                if end > chars.len() {
                    return Err(TextError::TooShort {
                        len: chars.len(),
                        needed: end,
                    });
                }
                if matches!(comp, TextComponent::Retain(_)) {
                    out.extend(&chars[idx..end]);
                }
                idx = end;
            }
            TextComponent::Insert(s) => out.push_str(s),
        }
    }
    out.extend(&chars[idx..]);
    Ok(out)
}

/// A delta equivalent to applying `first` and then `second`.
pub fn compose(first: &[TextComponent], second: &[TextComponent]) -> TextDelta {
    let mut out = TextDelta::new();
    let mut iter1 = first.iter().cloned();
    let mut iter2 = second.iter().cloned();
    let mut rem1: Option<TextComponent> = None;
    let mut rem2: Option<TextComponent> = None;

    loop {
        let c1 = rem1.take().or_else(|| iter1.next());
        let c2 = rem2.take().or_else(|| iter2.next());
        match (c1, c2) {
            (None, None) => break,
            (Some(c), None) | (None, Some(c)) => append(&mut out, c),
            (Some(c1), Some(c2)) => match (c1, c2) {
                // Deleted by the first delta: the second never saw it.
                (TextComponent::Delete(n), c2) => {
                    append(&mut out, TextComponent::Delete(n));
                    rem2 = Some(c2);
                }
                (c1, TextComponent::Insert(s)) => {
                    append(&mut out, TextComponent::Insert(s));
                    rem1 = Some(c1);
                }
                (TextComponent::Retain(n), TextComponent::Retain(m)) => {
                    append(&mut out, TextComponent::Retain(n.min(m)));
                    if n > m {
                        rem1 = Some(TextComponent::Retain(n - m));
                    } else if m > n {
                        rem2 = Some(TextComponent::Retain(m - n));
                    }
                }
                (TextComponent::Retain(n), TextComponent::Delete(m)) => {
                    append(&mut out, TextComponent::Delete(n.min(m)));
                    if n > m {
                        rem1 = Some(TextComponent::Retain(n - m));
                    } else if m > n {
                        rem2 = Some(TextComponent::Delete(m - n));
                    }
                }
                (TextComponent::Insert(s), TextComponent::Retain(m)) => {
                    let len = char_len(&s);
                    append(&mut out, TextComponent::Insert(s.chars().take(m).collect()));
                    if len > m {
                        rem1 = Some(TextComponent::Insert(s.chars().skip(m).collect()));
                    } else if m > len {
                        rem2 = Some(TextComponent::Retain(m - len));
                    }
                }
                // Inserted then deleted: cancels out.
                (TextComponent::Insert(s), TextComponent::Delete(m)) => {
                    let len = char_len(&s);
                    if len > m {
                        rem1 = Some(TextComponent::Insert(s.chars().skip(m).collect()));
                    } else if m > len {
                        rem2 = Some(TextComponent::Delete(m - len));
                    }
                }
            },
        }
    }
    normalize(out)
}

/// Rewrite `op` to apply after the concurrent `against`.
///
/// When both insert at the same position, `priority` puts `op`'s text
/// first; otherwise it lands after `against`'s.
pub fn transform(op: &[TextComponent], against: &[TextComponent], priority: bool) -> TextDelta {
    let mut out = TextDelta::new();
    let mut op_iter = op.iter().cloned();
    let mut ag_iter = against.iter().cloned();
    let mut rem_op: Option<TextComponent> = None;
    let mut rem_ag: Option<TextComponent> = None;

    loop {
        let o = rem_op.take().or_else(|| op_iter.next());
        let a = rem_ag.take().or_else(|| ag_iter.next());
        match (o, a) {
            (None, _) => break,
            (Some(o), None) => append(&mut out, o),
            (Some(o), Some(a)) => match (o, a) {
                (TextComponent::Insert(s), a @ TextComponent::Insert(_)) if priority => {
                    append(&mut out, TextComponent::Insert(s));
                    rem_ag = Some(a);
                }
                (o, TextComponent::Insert(s)) => {
                    append(&mut out, TextComponent::Retain(char_len(&s)));
                    rem_op = Some(o);
                }
                (TextComponent::Insert(s), a) => {
                    append(&mut out, TextComponent::Insert(s));
                    rem_ag = Some(a);
                }
                (TextComponent::Retain(n), TextComponent::Retain(m)) => {
                    append(&mut out, TextComponent::Retain(n.min(m)));
                    if n > m {
                        rem_op = Some(TextComponent::Retain(n - m));
                    } else if m > n {
                        rem_ag = Some(TextComponent::Retain(m - n));
                    }
                }
                // Already gone: nothing to retain.
                (TextComponent::Retain(n), TextComponent::Delete(m)) => {
                    if n > m {
                        rem_op = Some(TextComponent::Retain(n - m));
                    } else if m > n {
                        rem_ag = Some(TextComponent::Delete(m - n));
                    }
                }
                (TextComponent::Delete(n), TextComponent::Retain(m)) => {
                    append(&mut out, TextComponent::Delete(n.min(m)));
                    if n > m {
                        rem_op = Some(TextComponent::Delete(n - m));
                    } else if m > n {
                        rem_ag = Some(TextComponent::Retain(m - n));
                    }
                }
                // Deleted on both sides.
                (TextComponent::Delete(n), TextComponent::Delete(m)) => {
                    if n > m {
                        rem_op = Some(TextComponent::Delete(n - m));
                    } else if m > n {
                        rem_ag = Some(TextComponent::Delete(m - n));
                    }
                }
            },
        }
    }
    normalize(out)
}

/// The delta undoing `delta` on `base`, the text it was applied to.
pub fn invert(delta: &[TextComponent], base: &str) -> Result<TextDelta, TextError> {
    let chars: Vec<char> = base.chars().collect();
    let mut out = TextDelta::new();
    let mut idx = 0usize;
    for comp in delta {
        match comp {
            TextComponent::Retain(n) | TextComponent::Delete(n) => {
                let end = idx + n;
                if end > chars.len() {
                    return Err(TextError::TooShort {
                        len: chars.len(),
                        needed: end,
                    });
                }
                let undo = match comp {
                    TextComponent::Retain(_) => TextComponent::Retain(*n),
                    _ => TextComponent::Insert(chars[idx..end].iter().collect()),
                };
                append(&mut out, undo);
                idx = end;
            }
            TextComponent::Insert(s) => append(&mut out, TextComponent::Delete(char_len(s))),
        }
    }
    Ok(normalize(out))
}
