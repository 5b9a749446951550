//! Robots.txt parser implementation
//!
//! Only `Disallow` rules that apply to the wildcard agent are kept, and they are matched
//! as plain path prefixes. Globs, `Allow` lines and agent-specific groups are ignored.

/// Disallow rules applicable to the wildcard user agent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsRules {
    /// Path prefixes in file order
    disallow: Vec<String>,
}

impl RobotsRules {
    /// Parses raw robots.txt content
    ///
    /// A `User-agent:` line sets the active agent. A `Disallow:` line is recorded only
    /// while the active agent is `*` or no agent has been seen yet. An empty
    /// `Disallow:` value places no restriction.
    ///
    /// # Example
    ///
    /// ```
    /// use ui_harvest::robots::RobotsRules;
    ///
    /// let rules = RobotsRules::parse("User-agent: *\nDisallow: /private");
    /// assert!(!rules.is_allowed("/private/x"));
    /// assert!(rules.is_allowed("/public"));
    /// ```
    pub fn parse(content: &str) -> Self {
        let mut disallow = Vec::new();
        let mut agent: Option<String> = None;

        for line in content.lines() {
            let trimmed = line.trim();

            // Skip comments and empty lines
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let Some((key, value)) = trimmed.split_once(':') else {
                continue;
            };

            match key.trim().to_lowercase().as_str() {
                "user-agent" => {
                    agent = Some(value.trim().to_string());
                }
                "disallow" => {
                    let applies = agent.as_deref().map_or(true, |a| a == "*");
                    let rule = value.trim();
                    if applies && !rule.is_empty() {
                        disallow.push(rule.to_string());
                    }
                }
                _ => {}
            }
        }

        Self { disallow }
    }

    /// Creates a permissive ruleset that allows everything
    ///
    /// This is used when robots.txt cannot be fetched.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Returns false iff `path` starts with any recorded disallow prefix
    pub fn is_allowed(&self, path: &str) -> bool {
        !self.disallow.iter().any(|rule| path.starts_with(rule.as_str()))
    }

    /// Recorded disallow prefixes, in file order
    pub fn disallow_rules(&self) -> &[String] {
        &self.disallow
    }

    pub fn is_empty(&self) -> bool {
        self.disallow.is_empty()
    }
}
