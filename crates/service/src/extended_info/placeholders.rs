/// Named `[[name]]` tokens substituted into values on read.
///
/// Substitution is a single left-to-right pass: replacement text is never rescanned
/// and unknown tokens stay literal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderRegistry {
    entries: Vec<(String, String)>,
}

impl PlaceholderRegistry {
    pub fn new(wwwroot: impl Into<String>) -> Self {
        Self { entries: vec![("wwwroot".to_string(), wwwroot.into())] }
    }

    /// Add or replace a placeholder.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    pub fn from_site(site: &configs::SiteConfig) -> Self {
        site.placeholders
            .iter()
            .fold(Self::new(site.wwwroot.clone()), |reg, (name, value)| reg.with(name.clone(), value.clone()))
    }

    pub fn wwwroot(&self) -> &str {
        self.lookup("wwwroot").unwrap_or_default()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    fn lookup(&self, name: &str) -> Option<&str> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    pub fn substitute(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find("[[") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("]]") else {
                out.push_str(&rest[start..]);
                return out;
            };
            let name = &after[..end];
            match self.lookup(name) {
                Some(value) => {
                    out.push_str(value);
                    rest = &after[end + 2..];
                }
                None => {
                    // rescan from the second bracket so `[[[name]]` still matches
                    out.push('[');
                    rest = &rest[start + 1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reg() -> PlaceholderRegistry {
        PlaceholderRegistry::new("https://lms.example.edu")
    }

    #[test]
    fn substitutes_wwwroot() {
        assert_eq!(reg().substitute("[[wwwroot]]/blue"), "https://lms.example.edu/blue");
        assert_eq!(reg().substitute("a [[wwwroot]] b [[wwwroot]]"), "a https://lms.example.edu b https://lms.example.edu");
    }

    #[test]
    fn unknown_and_unterminated_tokens_stay_literal() {
        assert_eq!(reg().substitute("[[nope]] x"), "[[nope]] x");
        assert_eq!(reg().substitute("tail [[wwwroot"), "tail [[wwwroot");
        assert_eq!(reg().substitute("[[[wwwroot]]"), "[https://lms.example.edu");
        assert_eq!(reg().substitute("no tokens"), "no tokens");
    }

    #[test]
    fn replacement_is_not_rescanned() {
        let r = PlaceholderRegistry::new("[[home]]").with("home", "loop");
        assert_eq!(r.substitute("[[wwwroot]]"), "[[home]]");
    }

    #[test]
    fn site_placeholders_are_registered() {
        let mut site = configs::SiteConfig { wwwroot: "https://x.test".into(), ..Default::default() };
        site.placeholders.insert("support".into(), "help@x.test".into());
        let r = PlaceholderRegistry::from_site(&site);
        assert_eq!(r.names().collect::<Vec<_>>(), vec!["wwwroot", "support"]);
        assert_eq!(r.wwwroot(), "https://x.test");
        assert_eq!(r.substitute("[[support]] at [[wwwroot]]"), "help@x.test at https://x.test");
    }
}
