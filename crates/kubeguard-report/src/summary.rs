use kubeguard_types::{Finding, ScanSummary, Severity};
use std::collections::BTreeMap;
use std::fmt;

/// Aggregate severity classification of the whole scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Posture {
    Excellent,
    Fair,
    NeedsAttention,
    Critical,
}

impl Posture {
    pub fn as_str(self) -> &'static str {
        match self {
            Posture::Excellent => "EXCELLENT",
            Posture::Fair => "FAIR",
            Posture::NeedsAttention => "NEEDS ATTENTION",
            Posture::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Posture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Worst severity wins: any CRITICAL finding makes the posture CRITICAL, any
/// HIGH makes it NEEDS ATTENTION, anything at all makes it FAIR.
pub fn posture(findings: &[Finding]) -> Posture {
    if findings.iter().any(|f| f.severity == Severity::Critical) {
        Posture::Critical
    } else if findings.iter().any(|f| f.severity == Severity::High) {
        Posture::NeedsAttention
    } else if !findings.is_empty() {
        Posture::Fair
    } else {
        Posture::Excellent
    }
}

/// Partition findings by severity, most severe group first. Severities with
/// zero findings are omitted.
pub fn group_by_severity(findings: &[Finding]) -> Vec<(Severity, Vec<&Finding>)> {
    Severity::ALL
        .iter()
        .filter_map(|&severity| {
            let group: Vec<&Finding> =
                findings.iter().filter(|f| f.severity == severity).collect();
            (!group.is_empty()).then_some((severity, group))
        })
        .collect()
}

pub fn summarize(findings: &[Finding]) -> ScanSummary {
    let mut severity_breakdown: BTreeMap<String, u32> = BTreeMap::new();
    let mut category_breakdown: BTreeMap<String, u32> = BTreeMap::new();
    for finding in findings {
        *severity_breakdown
            .entry(finding.severity.as_str().to_string())
            .or_default() += 1;
        *category_breakdown
            .entry(finding.category.as_str().to_string())
            .or_default() += 1;
    }
    ScanSummary {
        severity_breakdown,
        category_breakdown,
        total_issues: findings.len() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubeguard_types::Category;

    fn finding(severity: Severity, category: Category) -> Finding {
        Finding {
            severity,
            category,
            title: "t".to_string(),
            resource_name: "r".to_string(),
            namespace: "n".to_string(),
            description: String::new(),
            recommendation: String::new(),
            remediation: String::new(),
        }
    }

    #[test]
    fn posture_escalates_with_worst_severity() {
        assert_eq!(posture(&[]), Posture::Excellent);
        assert_eq!(
            posture(&[finding(Severity::Low, Category::ResourceGovernance)]),
            Posture::Fair
        );
        assert_eq!(
            posture(&[
                finding(Severity::Low, Category::ResourceGovernance),
                finding(Severity::High, Category::AccessControl),
            ]),
            Posture::NeedsAttention
        );
        assert_eq!(
            posture(&[
                finding(Severity::High, Category::AccessControl),
                finding(Severity::Critical, Category::WorkloadSecurity),
            ]),
            Posture::Critical
        );
    }

    #[test]
    fn grouping_orders_by_severity_and_omits_empty_groups() {
        let findings = vec![
            finding(Severity::Low, Category::ResourceGovernance),
            finding(Severity::Critical, Category::WorkloadSecurity),
            finding(Severity::Low, Category::NetworkSegmentation),
        ];
        let groups = group_by_severity(&findings);
        let order: Vec<Severity> = groups.iter().map(|(s, _)| *s).collect();
        assert_eq!(order, vec![Severity::Critical, Severity::Low]);
        assert_eq!(groups[1].1.len(), 2);
    }

    #[test]
    fn summary_counts_by_severity_and_category() {
        let findings = vec![
            finding(Severity::High, Category::AccessControl),
            finding(Severity::High, Category::NetworkSegmentation),
            finding(Severity::Medium, Category::AccessControl),
        ];
        let summary = summarize(&findings);
        assert_eq!(summary.total_issues, 3);
        assert_eq!(summary.severity_breakdown["HIGH"], 2);
        assert_eq!(summary.severity_breakdown["MEDIUM"], 1);
        assert_eq!(summary.category_breakdown["Access Control"], 2);
        assert_eq!(summary.category_breakdown["Network Segmentation"], 1);
        assert!(!summary.severity_breakdown.contains_key("CRITICAL"));
    }
}
