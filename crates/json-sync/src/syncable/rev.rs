//! Revision counters.
//!
//! A revision is a base-36 counter over `0-9a-z`, optionally zero-padded
//! to a fixed width. Ordering ignores padding: leading zeros are stripped,
//! then the shorter string is smaller and equal lengths compare bytewise
//! (`'0' < '9' < 'a' < 'z'` in ASCII), which matches numeric order.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::SyncError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rev(String);

fn is_digit(c: u8) -> bool {
    c.is_ascii_digit() || c.is_ascii_lowercase()
}

impl Rev {
    /// The revision of a document nobody has changed yet: `"0"`.
    pub fn zero() -> Self {
        Rev("0".into())
    }

    pub fn parse(s: &str) -> Result<Self, SyncError> {
        if s.is_empty() || !s.bytes().all(is_digit) {
            return Err(SyncError::InvalidRev(s.to_string()));
        }
        Ok(Rev(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The following revision, left-padded with zeros to `pad` characters.
    ///
    /// ```
    /// use json_sync::syncable::Rev;
    ///
    /// let rev = Rev::parse("z").unwrap();
    /// assert_eq!(rev.next(None).as_str(), "10");
    /// assert_eq!(rev.next(Some(4)).as_str(), "0010");
    /// ```
    pub fn next(&self, pad: Option<usize>) -> Rev {
        let mut digits = self.significant().as_bytes().to_vec();
        let mut carry = true;
        for d in digits.iter_mut().rev() {
            match *d {
                b'9' => {
                    *d = b'a';
                    carry = false;
                }
                b'z' => *d = b'0',
                _ => {
                    *d += 1;
                    carry = false;
                }
            }
            if !carry {
                break;
            }
        }
        if carry {
            digits.insert(0, b'1');
        }
        let mut out = String::from_utf8_lossy(&digits).into_owned();
        if let Some(width) = pad {
            if out.len() < width {
                out = format!("{}{out}", "0".repeat(width - out.len()));
            }
        }
        Rev(out)
    }

    /// The digits without leading zeros; empty for zero.
    fn significant(&self) -> &str {
        self.0.trim_start_matches('0')
    }
}

impl Default for Rev {
    fn default() -> Self {
        Self::zero()
    }
}

impl PartialEq for Rev {
    fn eq(&self, other: &Self) -> bool {
        self.significant() == other.significant()
    }
}

impl Eq for Rev {}

impl Hash for Rev {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl Ord for Rev {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (self.significant(), other.significant());
        a.len().cmp(&b.len()).then_with(|| a.cmp(b))
    }
}

impl PartialOrd for Rev {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Rev {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Rev {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rev::parse(s)
    }
}

impl TryFrom<String> for Rev {
    type Error = SyncError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Rev::parse(&s)
    }
}

impl From<Rev> for String {
    fn from(rev: Rev) -> Self {
        rev.0
    }
}
