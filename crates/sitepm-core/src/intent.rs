/// Topic of a user request, picked by keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    RiskManagement,
    BudgetManagement,
    Planning,
    StakeholderEngagement,
    Permits,
    CostEstimation,
    Supervision,
    Contracts,
    TeamManagement,
    General,
}

/// Checked top to bottom; the first tag with a matching keyword wins.
const KEYWORDS: &[(Intent, &[&str])] = &[
    (Intent::RiskManagement, &["risk", "hazard", "safety", "danger"]),
    (Intent::BudgetManagement, &["budget", "cost", "expense", "financial"]),
    (Intent::Planning, &["schedule", "timeline", "deadline", "plan"]),
    (Intent::StakeholderEngagement, &["stakeholder", "client", "investor"]),
    (Intent::Permits, &["permit", "compliance", "regulation", "legal"]),
    (Intent::CostEstimation, &["estimate", "quote", "pricing"]),
    (Intent::Supervision, &["supervise", "monitor", "inspect"]),
    (Intent::Contracts, &["contract", "agreement", "document"]),
    (Intent::TeamManagement, &["team", "staff", "worker", "employee"]),
];

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::RiskManagement => "risk_management",
            Intent::BudgetManagement => "budget_management",
            Intent::Planning => "planning",
            Intent::StakeholderEngagement => "stakeholder_engagement",
            Intent::Permits => "permits",
            Intent::CostEstimation => "cost_estimation",
            Intent::Supervision => "supervision",
            Intent::Contracts => "contracts",
            Intent::TeamManagement => "team_management",
            Intent::General => "general",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::all().into_iter().find(|i| i.as_str() == s.to_lowercase())
    }

    pub fn all() -> Vec<Intent> {
        KEYWORDS
            .iter()
            .map(|(intent, _)| *intent)
            .chain(std::iter::once(Intent::General))
            .collect()
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Intent::RiskManagement => "Risk Management",
            Intent::BudgetManagement => "Budget Management",
            Intent::Planning => "Planning",
            Intent::StakeholderEngagement => "Stakeholder Engagement",
            Intent::Permits => "Permits & Compliance",
            Intent::CostEstimation => "Cost Estimation",
            Intent::Supervision => "Supervision",
            Intent::Contracts => "Contracts",
            Intent::TeamManagement => "Team Management",
            Intent::General => "General",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify free text by case-insensitive keyword substring match.
pub fn classify(text: &str) -> Intent {
    let lower = text.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::General)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_keywords() {
        assert_eq!(classify("Any SAFETY concerns on the scaffold?"), Intent::RiskManagement);
        assert_eq!(classify("what is the budget"), Intent::BudgetManagement);
        assert_eq!(classify("Move the deadline"), Intent::Planning);
        assert_eq!(classify("email the investor"), Intent::StakeholderEngagement);
        assert_eq!(classify("city permit"), Intent::Permits);
        assert_eq!(classify("give me a quote"), Intent::CostEstimation);
        assert_eq!(classify("inspect the welds"), Intent::Supervision);
        assert_eq!(classify("review the agreement"), Intent::Contracts);
        assert_eq!(classify("hire staff"), Intent::TeamManagement);
    }

    #[test]
    fn test_classify_default_general() {
        assert_eq!(classify("hello there"), Intent::General);
        assert_eq!(classify(""), Intent::General);
    }

    #[test]
    fn test_enumeration_order_wins() {
        // both risk and budget keywords: risk is checked first
        assert_eq!(classify("cost of safety gear"), Intent::RiskManagement);
        // "estimate" contains no earlier keyword, "cost" does
        assert_eq!(classify("estimate the cost"), Intent::BudgetManagement);
    }

    #[test]
    fn test_substring_match() {
        // "planning" contains "plan"
        assert_eq!(classify("floor planning"), Intent::Planning);
        // "documentation" contains "document"
        assert_eq!(classify("documentation"), Intent::Contracts);
    }

    #[test]
    fn test_str_round_trip() {
        for intent in Intent::all() {
            assert_eq!(Intent::from_str(intent.as_str()), Some(intent));
        }
        assert_eq!(Intent::all().len(), 10);
        assert_eq!(Intent::from_str("nope"), None);
    }
}
