//! Capability identifiers and grant results.
//!
//! A [`Capability`] names one gated operation on the host, such as reading
//! SMS or fine location. Capabilities are opaque to the negotiator: it only
//! compares them and hands them back to the host.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// An opaque identifier for one runtime-gated operation.
///
/// # Example
///
/// ```rust
/// use permit_core::capability::{self, Capability};
///
/// let sms = Capability::new("android.permission.READ_SMS");
/// assert_eq!(sms, capability::READ_SMS);
/// assert_eq!(sms.as_str(), "android.permission.READ_SMS");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capability(Cow<'static, str>);

impl Capability {
    /// Create a capability from any string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Create a capability from a static string without allocating.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// The identifier as the host knows it.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier without its `android.permission.` namespace, for display.
    pub fn short_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Capability {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Capability {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl AsRef<str> for Capability {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

pub const ACCESS_COARSE_LOCATION: Capability =
    Capability::from_static("android.permission.ACCESS_COARSE_LOCATION");
pub const ACCESS_FINE_LOCATION: Capability =
    Capability::from_static("android.permission.ACCESS_FINE_LOCATION");
pub const WRITE_EXTERNAL_STORAGE: Capability =
    Capability::from_static("android.permission.WRITE_EXTERNAL_STORAGE");
pub const READ_EXTERNAL_STORAGE: Capability =
    Capability::from_static("android.permission.READ_EXTERNAL_STORAGE");
pub const READ_CONTACTS: Capability = Capability::from_static("android.permission.READ_CONTACTS");
pub const READ_PHONE_STATE: Capability =
    Capability::from_static("android.permission.READ_PHONE_STATE");
pub const READ_SMS: Capability = Capability::from_static("android.permission.READ_SMS");
pub const READ_CALL_LOG: Capability = Capability::from_static("android.permission.READ_CALL_LOG");

/// The capability set the reference client asks for on startup.
pub fn standard_set() -> Vec<Capability> {
    vec![
        ACCESS_COARSE_LOCATION,
        ACCESS_FINE_LOCATION,
        WRITE_EXTERNAL_STORAGE,
        READ_EXTERNAL_STORAGE,
        READ_CONTACTS,
        READ_PHONE_STATE,
        READ_SMS,
        READ_CALL_LOG,
    ]
}

/// Outcome of a grant for one capability, using the host's numeric convention.
///
/// `0` means granted and `-1` means denied. The default is `Granted` because
/// freshly allocated result storage is zero-filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i32", from = "i32")]
pub enum GrantResult {
    #[default]
    Granted,
    Denied,
}

impl GrantResult {
    pub const GRANTED_CODE: i32 = 0;
    pub const DENIED_CODE: i32 = -1;

    /// Map a raw host code. Anything other than `0` is a denial.
    pub fn from_code(code: i32) -> Self {
        if code == Self::GRANTED_CODE {
            GrantResult::Granted
        } else {
            GrantResult::Denied
        }
    }

    /// The numeric form the host uses.
    pub fn code(self) -> i32 {
        match self {
            GrantResult::Granted => Self::GRANTED_CODE,
            GrantResult::Denied => Self::DENIED_CODE,
        }
    }

    pub fn is_granted(self) -> bool {
        self == GrantResult::Granted
    }
}

impl From<i32> for GrantResult {
    fn from(code: i32) -> Self {
        Self::from_code(code)
    }
}

impl From<GrantResult> for i32 {
    fn from(result: GrantResult) -> Self {
        result.code()
    }
}

impl From<bool> for GrantResult {
    fn from(granted: bool) -> Self {
        if granted {
            GrantResult::Granted
        } else {
            GrantResult::Denied
        }
    }
}

impl std::fmt::Display for GrantResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrantResult::Granted => write!(f, "granted"),
            GrantResult::Denied => write!(f, "denied"),
        }
    }
}
