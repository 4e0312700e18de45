//! Flat `KEY=VALUE` metadata grouped by domain.
//!
//! Every raster dataset carries metadata in named domains; the default domain
//! is the empty string and RPC coefficients live in the `"RPC"` domain.
//! Domains are returned as explicit, length-known lists.

use crate::cpl::CslStringList;
use crate::errors::Result;

/// One metadata item and the domain it lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEntry {
    pub domain: String,
    pub key: String,
    pub value: String,
}

impl MetadataEntry {
    pub fn new(domain: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Read and write access to an object's metadata.
pub trait Metadata {
    /// The object's description, often the file name it was opened from.
    fn description(&self) -> Result<String>;

    /// Names of the domains holding metadata. The default domain is `""`.
    fn metadata_domains(&self) -> Vec<String>;

    /// All items of `domain` as `KEY=VALUE` strings, `None` if the domain is unknown.
    fn metadata_domain(&self, domain: &str) -> Option<Vec<String>>;

    /// Sets `key` to `value` in `domain`.
    fn set_metadata_item(&mut self, key: &str, value: &str, domain: &str) -> Result<()>;

    /// Single item lookup.
    fn metadata_item(&self, key: &str, domain: &str) -> Option<String> {
        self.metadata_domain(domain)?.into_iter().find_map(|item| {
            let (k, v) = item.split_once('=')?;
            k.eq_ignore_ascii_case(key).then(|| v.to_string())
        })
    }

    /// Every item of every domain.
    fn metadata(&self) -> Vec<MetadataEntry> {
        let mut entries = Vec::new();
        for domain in self.metadata_domains() {
            for item in self.metadata_domain(&domain).unwrap_or_default() {
                if let Some((key, value)) = item.split_once('=') {
                    entries.push(MetadataEntry::new(domain.as_str(), key, value));
                }
            }
        }
        entries
    }
}

/// In-memory metadata, one option list per domain.
#[derive(Debug, Clone, Default)]
pub struct MetadataDomains {
    description: String,
    domains: Vec<(String, CslStringList)>,
}

impl MetadataDomains {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_description(&mut self, description: &str) {
        self.description = description.to_string();
    }

    /// The option list behind `domain`.
    pub fn domain(&self, domain: &str) -> Option<&CslStringList> {
        self.domains
            .iter()
            .find(|(d, _)| d == domain)
            .map(|(_, items)| items)
    }
}

impl Metadata for MetadataDomains {
    fn description(&self) -> Result<String> {
        Ok(self.description.clone())
    }

    fn metadata_domains(&self) -> Vec<String> {
        self.domains.iter().map(|(d, _)| d.clone()).collect()
    }

    fn metadata_domain(&self, domain: &str) -> Option<Vec<String>> {
        self.domain(domain).map(CslStringList::to_strings)
    }

    fn set_metadata_item(&mut self, key: &str, value: &str, domain: &str) -> Result<()> {
        match self.domains.iter_mut().find(|(d, _)| d == domain) {
            Some((_, items)) => items.set_name_value(key, value),
            None => {
                let mut items = CslStringList::new();
                items.set_name_value(key, value)?;
                self.domains.push((domain.to_string(), items));
                Ok(())
            }
        }
    }

    fn metadata_item(&self, key: &str, domain: &str) -> Option<String> {
        self.domain(domain)?
            .fetch_name_value(key)
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_domain_is_none() {
        let md = MetadataDomains::new();
        assert_eq!(md.metadata_domain("does not exist"), None);
        assert_eq!(md.metadata_item("KEY", ""), None);
    }

    #[test]
    fn items_by_domain() -> Result<()> {
        let mut md = MetadataDomains::new();
        md.set_metadata_item("AREA_OR_POINT", "Area", "")?;
        md.set_metadata_item("LINE_OFF", "2047", "RPC")?;
        md.set_metadata_item("SAMP_OFF", "1023", "RPC")?;

        assert_eq!(md.metadata_domains(), vec!["".to_string(), "RPC".to_string()]);
        assert_eq!(
            md.metadata_domain("RPC"),
            Some(vec!["LINE_OFF=2047".to_string(), "SAMP_OFF=1023".to_string()])
        );
        assert_eq!(md.metadata_item("line_off", "RPC"), Some("2047".to_string()));
        assert_eq!(md.metadata_item("LINE_OFF", ""), None);
        assert_eq!(
            md.metadata(),
            vec![
                MetadataEntry::new("", "AREA_OR_POINT", "Area"),
                MetadataEntry::new("RPC", "LINE_OFF", "2047"),
                MetadataEntry::new("RPC", "SAMP_OFF", "1023"),
            ]
        );
        Ok(())
    }
}
