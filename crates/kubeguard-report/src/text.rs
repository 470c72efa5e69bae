//! Console rendering of the finding sequence.
//!
//! Colorization is a constructor capability, not global state: a renderer
//! built with `color = false` emits plain text byte-for-byte suitable for
//! redirection.

use crate::summary::{Posture, group_by_severity, posture};
use colored::Colorize;
use kubeguard_types::{Finding, Severity};

const RULE_WIDTH: usize = 60;

pub struct TextRenderer {
    color: bool,
}

impl TextRenderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn render(&self, findings: &[Finding]) -> String {
        let mut out = String::new();

        if findings.is_empty() {
            let rule = "=".repeat(RULE_WIDTH);
            out.push_str(&format!("{}\n", self.green(&rule)));
            out.push_str(&format!("{}\n", self.green("No security issues found!")));
            out.push_str(&format!("{}\n", self.green(&rule)));
            self.push_posture(&mut out, Posture::Excellent);
            return out;
        }

        let rule = "=".repeat(RULE_WIDTH);
        out.push_str(&format!("{}\n", self.red(&rule)));
        out.push_str(&format!("{}\n", self.red("Security Issues Detected")));
        out.push_str(&format!("{}\n\n", self.red(&rule)));

        for (severity, group) in group_by_severity(findings) {
            self.push_group(&mut out, severity, &group);
        }

        self.push_summary(&mut out, findings);
        out
    }

    fn push_group(&self, out: &mut String, severity: Severity, group: &[&Finding]) {
        let divider = "-".repeat(RULE_WIDTH);
        out.push_str(&format!("{}\n", self.severity_paint(severity, &divider)));
        out.push_str(&format!(
            "{}\n",
            self.severity_paint(severity, &format!("{severity} Issues ({})", group.len()))
        ));
        out.push_str(&format!("{}\n\n", self.severity_paint(severity, &divider)));

        for finding in group {
            out.push_str(&format!(
                "{}\n",
                self.severity_paint(severity, &format!("[{severity}] {}", finding.title))
            ));
            out.push_str(&format!("  Resource: {}\n", finding.resource_name));
            out.push_str(&format!("  Namespace: {}\n", finding.namespace));
            out.push_str(&format!("  Category: {}\n", finding.category));
            if !finding.description.is_empty() {
                out.push_str(&format!("  Description: {}\n", finding.description));
            }
            if !finding.recommendation.is_empty() {
                out.push_str(&format!(
                    "  {}\n",
                    self.cyan(&format!("Recommendation: {}", finding.recommendation))
                ));
            }
            if !finding.remediation.is_empty() {
                out.push_str(&format!(
                    "  {}\n",
                    self.green(&format!("Remediation: {}", finding.remediation))
                ));
            }
            out.push('\n');
        }
    }

    fn push_summary(&self, out: &mut String, findings: &[Finding]) {
        let rule = "=".repeat(RULE_WIDTH);
        out.push_str(&format!("{}\n", self.cyan(&rule)));
        out.push_str(&format!("{}\n", self.cyan("Summary")));
        out.push_str(&format!("{}\n\n", self.cyan(&rule)));

        out.push_str(&format!("{:<16} {:>5}\n", "Severity", "Count"));
        for severity in Severity::ALL {
            let count = findings.iter().filter(|f| f.severity == severity).count();
            if count > 0 {
                out.push_str(&format!("{:<16} {:>5}\n", severity.as_str(), count));
            }
        }
        out.push_str(&format!("{:<16} {:>5}\n\n", "TOTAL ISSUES", findings.len()));

        self.push_posture(out, posture(findings));
    }

    fn push_posture(&self, out: &mut String, posture: Posture) {
        let line = match posture {
            Posture::Critical => "Security Posture: CRITICAL - Immediate action required!",
            Posture::NeedsAttention => {
                "Security Posture: NEEDS ATTENTION - Address high-priority issues"
            }
            Posture::Fair => "Security Posture: FAIR - Minor improvements recommended",
            Posture::Excellent => "Security Posture: EXCELLENT - No issues detected",
        };
        let painted = match posture {
            Posture::Critical => self.red(line),
            Posture::NeedsAttention | Posture::Fair => self.yellow(line),
            Posture::Excellent => self.green(line),
        };
        out.push_str(&format!("{painted}\n"));
    }

    fn severity_paint(&self, severity: Severity, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        match severity {
            Severity::Critical => text.red(),
            Severity::High => text.bright_red(),
            Severity::Medium => text.yellow(),
            Severity::Low => text.bright_yellow(),
            Severity::Info => text.cyan(),
        }
        .to_string()
    }

    fn red(&self, text: &str) -> String {
        if self.color { text.red().to_string() } else { text.to_string() }
    }

    fn green(&self, text: &str) -> String {
        if self.color { text.green().to_string() } else { text.to_string() }
    }

    fn yellow(&self, text: &str) -> String {
        if self.color { text.yellow().to_string() } else { text.to_string() }
    }

    fn cyan(&self, text: &str) -> String {
        if self.color { text.cyan().to_string() } else { text.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubeguard_types::Category;

    fn finding(severity: Severity, title: &str) -> Finding {
        Finding {
            severity,
            category: Category::WorkloadSecurity,
            title: title.to_string(),
            resource_name: "web/app".to_string(),
            namespace: "default".to_string(),
            description: "something is off".to_string(),
            recommendation: "tighten it".to_string(),
            remediation: "set a flag".to_string(),
        }
    }

    #[test]
    fn clean_scan_renders_all_clear() {
        let text = TextRenderer::new(false).render(&[]);
        assert!(text.contains("No security issues found!"));
        assert!(text.contains("Security Posture: EXCELLENT"));
    }

    #[test]
    fn groups_are_rendered_most_severe_first_and_empty_groups_omitted() {
        let findings = vec![
            finding(Severity::Low, "small thing"),
            finding(Severity::Critical, "big thing"),
        ];
        let text = TextRenderer::new(false).render(&findings);

        let critical_at = text.find("CRITICAL Issues (1)").expect("critical header");
        let low_at = text.find("LOW Issues (1)").expect("low header");
        assert!(critical_at < low_at);
        assert!(!text.contains("MEDIUM Issues"));
        assert!(text.contains("[CRITICAL] big thing"));
        assert!(text.contains("Recommendation: tighten it"));
        assert!(text.contains("Remediation: set a flag"));
        assert!(text.contains(&format!("{:<16} {:>5}", "TOTAL ISSUES", 2)));
        assert!(text.contains("Security Posture: CRITICAL"));
    }

    #[test]
    fn plain_renderer_emits_no_escape_codes() {
        let findings = vec![finding(Severity::High, "issue")];
        let text = TextRenderer::new(false).render(&findings);
        assert!(!text.contains('\u{1b}'));
    }

    #[test]
    fn empty_guidance_fields_are_skipped() {
        let mut bare = finding(Severity::Medium, "quiet");
        bare.recommendation = String::new();
        bare.remediation = String::new();
        bare.description = String::new();
        let text = TextRenderer::new(false).render(&[bare]);
        assert!(!text.contains("Recommendation:"));
        assert!(!text.contains("Remediation:"));
        assert!(!text.contains("Description:"));
    }
}
