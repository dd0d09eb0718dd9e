use std::borrow::Cow;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub key: Cow<'static, str>,
    pub name: Cow<'static, str>,
}

impl License {
    const fn known(key: &'static str, name: &'static str) -> Self {
        Self {
            key: Cow::Borrowed(key),
            name: Cow::Borrowed(name),
        }
    }

    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: Cow::Owned(key.into()),
            name: Cow::Owned(name.into()),
        }
    }
}

pub const MIT: License = License::known("mit", "MIT");
pub const APACHE_2_0: License = License::known("apache-2.0", "Apache 2.0");
pub const BSD_3_CLAUSE: License = License::known("bsd-3-clause", "BSD 3-Clause");
pub const BSD_2_CLAUSE: License = License::known("bsd-2-clause", "BSD 2-Clause");
pub const ISC: License = License::known("isc", "ISC");
pub const MPL_2_0: License = License::known("mpl-2.0", "Mozilla Public License 2.0");
pub const GPL_3_0: License = License::known("gpl-3.0", "GNU General Public License 3.0");
pub const GPL_2_0: License = License::known("gpl-2.0", "GNU General Public License 2.0");
pub const LGPL_2_1: License =
    License::known("lgpl-2.1", "GNU Lesser General Public License 2.1");
pub const LGPL_3_0: License =
    License::known("lgpl-3.0", "GNU Lesser General Public License 3.0");
pub const AGPL_3_0: License =
    License::known("agpl-3.0", "GNU Affero General Public License 3.0");
pub const CC0_1_0: License = License::known("cc0-1.0", "Creative Commons Zero v1.0 Universal");
pub const EPL_2_0: License = License::known("epl-2.0", "Eclipse Public License 2.0");
pub const UNLICENSE: License = License::known("unlicense", "The Unlicense");

pub const LICENSE_LIST: &[License] = &[
    MIT,
    APACHE_2_0,
    BSD_3_CLAUSE,
    BSD_2_CLAUSE,
    ISC,
    MPL_2_0,
    GPL_3_0,
    GPL_2_0,
    LGPL_2_1,
    LGPL_3_0,
    AGPL_3_0,
    CC0_1_0,
    EPL_2_0,
    UNLICENSE,
];

pub fn find_license(key: &str) -> Option<&'static License> {
    LICENSE_LIST.iter().find(|license| license.key == key)
}

pub fn license_keys() -> impl Iterator<Item = &'static str> {
    LICENSE_LIST.iter().map(|license| license.key.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_resolves() {
        for key in license_keys() {
            assert_eq!(find_license(key).map(|l| l.key.as_ref()), Some(key));
        }
        assert_eq!(LICENSE_LIST.len(), 14);
    }

    #[test]
    fn unknown_key_is_none() {
        assert!(find_license("wtfpl").is_none());
    }
}
