//! Option lists in the style of GDAL's Common Portability Library.
//!
//! GDAL passes `KEY=VALUE` options around as null-terminated arrays of C
//! strings ("CSL" lists). [`CslStringList`] keeps the same semantics
//! (validated keys, case-insensitive lookup, overwrite on duplicate keys)
//! as an owned, length-known Rust value, and only builds the C
//! representation at the FFI boundary.

use std::fmt::{Debug, Formatter};

use crate::errors::{GdalError, Result};

/// Ordered list of `KEY=VALUE` options.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CslStringList {
    entries: Vec<(String, String)>,
}

impl CslStringList {
    /// Creates an empty option list.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Assigns `value` to `name`.
    ///
    /// Overwrites duplicate `name`s, comparing them case-insensitively.
    ///
    /// Returns `Ok<()>` on success, `Err<GdalError>` if `name` has non alphanumeric
    /// characters, or `value` has newline characters.
    pub fn set_name_value(&mut self, name: &str, value: &str) -> Result<()> {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(GdalError::BadArgument(format!(
                "Invalid characters in name: '{name}'"
            )));
        }
        if value.contains(['\n', '\r']) {
            return Err(GdalError::BadArgument(format!(
                "Invalid characters in value: '{value}'"
            )));
        }

        match self
            .entries
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value.to_owned(),
            None => self.entries.push((name.to_owned(), value.to_owned())),
        }
        Ok(())
    }

    /// Parses a single `KEY=VALUE` string and adds it to the list.
    pub fn add_string(&mut self, name_value: &str) -> Result<()> {
        match name_value.split_once('=') {
            Some((name, value)) => self.set_name_value(name.trim(), value),
            None => Err(GdalError::BadArgument(format!(
                "Expected KEY=VALUE, got '{name_value}'"
            ))),
        }
    }

    /// Builds a list from `KEY=VALUE` strings, e.g. the entries of a metadata domain.
    pub fn from_strings<S: AsRef<str>>(items: &[S]) -> Result<Self> {
        let mut list = Self::new();
        for item in items {
            list.add_string(item.as_ref())?;
        }
        Ok(list)
    }

    /// Looks up the value corresponding to `key`, ignoring case.
    pub fn fetch_name_value(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Looks up `key`, falling back to `default` when absent.
    pub fn fetch_name_value_def<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.fetch_name_value(key).unwrap_or(default)
    }

    /// Removes `key` if present, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self
            .entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(key))?;
        Some(self.entries.remove(idx).1)
    }

    /// Determine the number of entries in the list.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Determine if the list has any values
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get an iterator over the name/value elements of the list.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The entries rendered back as `KEY=VALUE` strings.
    pub fn to_strings(&self) -> Vec<String> {
        self.iter().map(|(k, v)| format!("{k}={v}")).collect()
    }

    /// Marshals the list into the null-terminated `char **` layout GDAL expects.
    #[cfg(feature = "gdal")]
    pub(crate) fn to_c_list(&self) -> Result<CStringList> {
        CStringList::new(&self.to_strings())
    }
}

impl Debug for CslStringList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (k, v) in self.iter() {
            f.write_fmt(format_args!("{k}={v}\n"))?;
        }
        Ok(())
    }
}

/// Creates a [`CslStringList`] from a slice of _key_/_value_ tuples.
impl<const N: usize> From<&[(&str, &str); N]> for CslStringList {
    fn from(pairs: &[(&str, &str); N]) -> Self {
        let mut result = Self::default();
        for (k, v) in pairs {
            result.set_name_value(k, v).expect("valid key/value pair");
        }
        result
    }
}

/// Owned C strings plus the null-terminated pointer array that refers to them.
///
/// The pointer array is only valid while this value is alive.
#[cfg(feature = "gdal")]
pub(crate) struct CStringList {
    _strings: Vec<std::ffi::CString>,
    ptrs: Vec<*mut libc::c_char>,
}

#[cfg(feature = "gdal")]
impl CStringList {
    pub(crate) fn new<S: AsRef<str>>(items: &[S]) -> Result<Self> {
        let strings = items
            .iter()
            .map(|s| std::ffi::CString::new(s.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut ptrs: Vec<*mut libc::c_char> = strings
            .iter()
            .map(|s| s.as_ptr() as *mut libc::c_char)
            .collect();
        ptrs.push(std::ptr::null_mut());
        Ok(Self {
            _strings: strings,
            ptrs,
        })
    }

    pub(crate) fn as_mut_ptr(&mut self) -> *mut *mut libc::c_char {
        self.ptrs.as_mut_ptr()
    }
}
