use colored::Colorize;
use kube::{Resource, ResourceExt};
use serde::Serialize;
use similar::TextDiff;

use crate::error::Error;

/// Lines of unchanged context around each change.
const CONTEXT_LINES: usize = 3;

#[derive(Debug, Clone, Copy, Default)]
pub struct DiffOptions {
    /// Keep `metadata.managedFields`, which change on nearly every write.
    pub managed_fields: bool,
}

fn label<K: Resource>(obj: &K) -> String {
    let name = match obj.namespace() {
        Some(namespace) => format!("{namespace}/{}", obj.name_any()),
        None => obj.name_any(),
    };

    match obj.resource_version() {
        Some(version) => format!("{name} ({version})"),
        None => name,
    }
}

fn snapshot<K>(obj: &K, options: DiffOptions) -> Result<String, Error>
where
    K: Resource + Serialize + Clone,
{
    let mut obj = obj.clone();
    if !options.managed_fields {
        obj.meta_mut().managed_fields = None;
    }

    Ok(serde_yaml::to_string(&obj)?)
}

/// Renders a unified diff between two versions of the same object.
///
/// Returns an empty string when the versions serialize identically.
pub fn render<K>(old: &K, new: &K, options: DiffOptions) -> Result<String, Error>
where
    K: Resource + Serialize + Clone,
{
    let before = snapshot(old, options)?;
    let after = snapshot(new, options)?;

    if before == after {
        return Ok(String::new());
    }

    Ok(TextDiff::from_lines(&before, &after)
        .unified_diff()
        .context_radius(CONTEXT_LINES)
        .header(&label(old), &label(new))
        .to_string())
}

/// Colors added lines green and removed lines red, leaving the rest untouched.
pub fn colorize(diff: &str) -> String {
    diff.split('\n')
        .map(|line| {
            if line.starts_with('+') {
                line.green().to_string()
            } else if line.starts_with('-') {
                line.red().to_string()
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use colored::Colorize;
    use k8s_openapi::{
        api::core::v1::ConfigMap,
        apimachinery::pkg::apis::meta::v1::{ManagedFieldsEntry, ObjectMeta},
    };

    use super::{colorize, render, DiffOptions};

    fn config_map(version: &str, value: &str, manager: &str) -> ConfigMap {
        ConfigMap {
            metadata: ObjectMeta {
                name: Some("settings".to_string()),
                namespace: Some("default".to_string()),
                resource_version: Some(version.to_string()),
                managed_fields: Some(vec![ManagedFieldsEntry {
                    manager: Some(manager.to_string()),
                    ..ManagedFieldsEntry::default()
                }]),
                ..ObjectMeta::default()
            },
            data: Some(BTreeMap::from([("key".to_string(), value.to_string())])),
            ..ConfigMap::default()
        }
    }

    #[test]
    fn colorize_marks_added_and_removed_lines() {
        colored::control::set_override(true);

        let colored = colorize("  same\n+added\n-removed\n");
        let lines: Vec<_> = colored.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "  same");
        assert_eq!(lines[1], "+added".green().to_string());
        assert_eq!(lines[2], "-removed".red().to_string());
        assert!(lines[1].starts_with("\u{1b}[32m"));
        assert!(lines[2].starts_with("\u{1b}[31m"));
    }

    #[test]
    fn colorize_keeps_line_order_and_trailing_newline() {
        let diff = indoc::indoc! {"
            @@ -1,2 +1,2 @@
             context
            +after
        "};

        let colored = colorize(diff);

        assert!(colored.ends_with('\n'));
        assert_eq!(colored.lines().next(), Some("@@ -1,2 +1,2 @@"));
        assert_eq!(colored.lines().nth(1), Some(" context"));
    }

    #[test]
    fn render_shows_changed_fields() {
        let old = config_map("1", "old", "kubectl");
        let new = config_map("2", "new", "kubectl");

        let diff = render(&old, &new, DiffOptions::default()).unwrap();

        assert!(diff.starts_with("--- default/settings (1)\n+++ default/settings (2)\n"));
        assert!(diff.contains("\n-  key: old\n"), "{diff}");
        assert!(diff.contains("\n+  key: new\n"), "{diff}");
        assert!(!diff.contains("managedFields"), "{diff}");
    }

    #[test]
    fn identical_versions_render_nothing() {
        let old = config_map("1", "same", "kubectl");

        assert_eq!(render(&old, &old.clone(), DiffOptions::default()).unwrap(), "");
    }

    #[test]
    fn managed_fields_only_show_when_asked() {
        let old = config_map("1", "same", "kubectl");
        let new = config_map("1", "same", "helm");

        assert_eq!(render(&old, &new, DiffOptions::default()).unwrap(), "");

        let diff = render(
            &old,
            &new,
            DiffOptions {
                managed_fields: true,
            },
        )
        .unwrap();
        let changed = |marker: char, line: &str| {
            diff.lines()
                .any(|l| l.starts_with(marker) && l[1..].trim() == line)
        };
        assert!(changed('+', "- manager: helm"), "{diff}");
        assert!(changed('-', "- manager: kubectl"), "{diff}");
    }
}
