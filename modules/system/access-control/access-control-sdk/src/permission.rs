use std::fmt;

/// Action segment granting every action within a module.
pub const WILDCARD_ACTION: &str = "*";

/// Separators accepted in granted permission strings, in priority order.
///
/// `.` is canonical. `:` and `_` are legacy spellings still issued by older
/// backends; removing them only requires editing this list.
const SEPARATORS: [char; 3] = ['.', ':', '_'];

/// A permission normalized to `(module, action)`.
///
/// Serializes to format: `"{module}.{action}"`
/// Examples:
///  - `"crm.read"`
///  - `"inventory.*"` (module wildcard)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalPermission {
    module: String,
    action: String,
}

/// Parse a permission string in any accepted spelling.
///
/// Lower-cases both parts and splits on the highest-priority separator present.
/// For the legacy `_` form this is the split at the last underscore, so
/// `"purchase_order_create"` reads as module `purchase_order`, action `create`.
/// Use [`permission_candidates`] when the other readings matter too.
///
/// Returns `None` (never panics) for strings without a separator or with an
/// empty module or action.
#[must_use]
pub fn parse_permission(raw: &str) -> Option<CanonicalPermission> {
    permission_candidates(raw).into_iter().next()
}

/// Every `(module, action)` reading of a permission string.
///
/// The `.` and `:` forms have exactly one reading. The legacy `_` form is
/// ambiguous once module or action contain an underscore themselves, so it
/// yields one reading per underscore, the last-underscore split first:
/// `"sales_create_invoice"` reads as `sales_create.invoice` and
/// `sales.create_invoice`.
///
/// Empty for malformed strings.
#[must_use]
pub fn permission_candidates(raw: &str) -> Vec<CanonicalPermission> {
    let raw = raw.trim();
    match SEPARATORS.into_iter().find(|sep| raw.contains(*sep)) {
        Some('_') => raw
            .match_indices('_')
            .rev()
            .filter_map(|(at, _)| CanonicalPermission::new(raw.get(..at)?, raw.get(at + 1..)?))
            .collect(),
        Some(sep) => raw
            .split_once(sep)
            .and_then(|(module, action)| CanonicalPermission::new(module, action))
            .into_iter()
            .collect(),
        None => Vec::new(),
    }
}

impl CanonicalPermission {
    /// Build from already separated parts. `None` if either part is blank.
    #[must_use]
    pub fn new(module: &str, action: &str) -> Option<Self> {
        let module = module.trim();
        let action = action.trim();
        if module.is_empty() || action.is_empty() {
            return None;
        }
        Some(Self {
            module: module.to_ascii_lowercase(),
            action: action.to_ascii_lowercase(),
        })
    }

    /// The `"<module>.*"` permission for `module`.
    #[must_use]
    pub fn wildcard(module: &str) -> Option<Self> {
        Self::new(module, WILDCARD_ACTION)
    }

    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.action == WILDCARD_ACTION
    }

    /// Returns `true` if holding `self` grants `other`.
    #[must_use]
    pub fn covers(&self, other: &CanonicalPermission) -> bool {
        self.module == other.module && (self.is_wildcard() || self.action == other.action)
    }
}

impl fmt::Display for CanonicalPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.action)
    }
}

impl serde::Serialize for CanonicalPermission {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for CanonicalPermission {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_permission(&s).ok_or_else(|| {
            serde::de::Error::custom(format!("Expected format 'module.action', got: {s}"))
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn perm(module: &str, action: &str) -> CanonicalPermission {
        CanonicalPermission::new(module, action).unwrap()
    }

    #[test]
    fn all_separator_spellings_normalize_to_the_same_permission() {
        let expected = perm("crm", "read");
        for raw in ["crm.read", "crm:read", "crm_read", "CRM.Read", "  crm:READ "] {
            assert_eq!(parse_permission(raw), Some(expected.clone()), "{raw}");
        }
    }

    #[test]
    fn dot_takes_priority_over_underscore() {
        assert_eq!(
            parse_permission("human_resources.read"),
            Some(perm("human_resources", "read"))
        );
        assert_eq!(
            parse_permission("sales.create_invoice"),
            Some(perm("sales", "create_invoice"))
        );
    }

    #[test]
    fn legacy_underscore_splits_at_last_underscore() {
        assert_eq!(
            parse_permission("purchase_order_create"),
            Some(perm("purchase_order", "create"))
        );
    }

    #[test]
    fn underscore_form_yields_every_split() {
        assert_eq!(
            permission_candidates("sales_create_invoice"),
            vec![perm("sales_create", "invoice"), perm("sales", "create_invoice")]
        );
        assert_eq!(permission_candidates("crm_read"), vec![perm("crm", "read")]);
    }

    #[test]
    fn separated_forms_have_a_single_reading() {
        assert_eq!(
            permission_candidates("sales.create_invoice"),
            vec![perm("sales", "create_invoice")]
        );
        assert_eq!(
            permission_candidates("sales:create_invoice"),
            vec![perm("sales", "create_invoice")]
        );
    }

    #[test]
    fn malformed_strings_do_not_parse() {
        for raw in ["", "crm", ".read", "crm.", "crm:", "_", "   ", "my_mod."] {
            assert_eq!(parse_permission(raw), None, "{raw:?}");
            assert!(permission_candidates(raw).is_empty(), "{raw:?}");
        }
    }

    #[test]
    fn wildcard_covers_every_action_in_its_module_only() {
        let wildcard = CanonicalPermission::wildcard("inventory").unwrap();
        assert!(wildcard.is_wildcard());
        assert!(wildcard.covers(&perm("inventory", "read")));
        assert!(wildcard.covers(&perm("inventory", "delete")));
        assert!(!wildcard.covers(&perm("crm", "read")));
        assert!(!perm("inventory", "read").covers(&perm("inventory", "write")));
    }

    #[test]
    fn serializes_in_dotted_form() {
        let json = serde_json::to_string(&perm("sales", "create")).unwrap();
        assert_eq!(json, r#""sales.create""#);

        let parsed: CanonicalPermission = serde_json::from_str(r#""sales:create""#).unwrap();
        assert_eq!(parsed, perm("sales", "create"));
    }

    #[test]
    fn deserialize_rejects_malformed_permission() {
        let result: Result<CanonicalPermission, _> = serde_json::from_str(r#""sales""#);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Expected format 'module.action'"));
    }
}
