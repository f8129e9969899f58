//! The fixed specialist panel and its insight buckets.

/// One panelist in the shared conversation.
#[derive(Debug, Clone, Copy)]
pub struct Panelist {
    pub name: &'static str,
    /// Insight bucket this panelist's messages land in.
    pub bucket: &'static str,
    pub system_message: &'static str,
    /// Relevance keywords used by automatic speaker selection.
    pub keywords: &'static [&'static str],
}

/// Name the conversation seed is attributed to.
pub const ADMIN_NAME: &str = "PlatformAdmin";
pub const ADMIN_BUCKET: &str = "admin";

pub const CONTENT_STRATEGIST: Panelist = Panelist {
    name: "ContentStrategist",
    bucket: "content_strategy",
    system_message: "You are a content strategy expert for ConnectSphere. \
        Analyze content trends and user engagement, suggest content strategies \
        for platform growth, coordinate with moderation and personalization, \
        and optimize content distribution and discovery.",
    keywords: &["content", "engagement", "trend", "distribution", "discovery", "creator"],
};

pub const UX_SPECIALIST: Panelist = Panelist {
    name: "UXSpecialist",
    bucket: "ux_improvements",
    system_message: "You are a UX specialist for ConnectSphere. Analyze user \
        behavior and feedback, suggest UI/UX improvements, optimize user \
        journeys and flows, and ensure accessibility and usability.",
    keywords: &["user", "ux", "interface", "experience", "accessibility", "usability", "journey"],
};

pub const ECONOMIC_ANALYST: Panelist = Panelist {
    name: "EconomicAnalyst",
    bucket: "economic_recommendations",
    system_message: "You are an economic analyst for ConnectSphere. Analyze \
        transaction patterns, optimize tokenomics and incentives, monitor \
        platform economics, and suggest revenue optimization strategies.",
    keywords: &["revenue", "transaction", "token", "economic", "incentive", "monetization"],
};

pub const GOVERNANCE_COORDINATOR: Panelist = Panelist {
    name: "GovernanceCoordinator",
    bucket: "governance_actions",
    system_message: "You are a governance coordinator for ConnectSphere. \
        Manage proposals and voting, ensure platform policies are followed, \
        coordinate community governance, and facilitate consensus building.",
    keywords: &["governance", "proposal", "policy", "vote", "community", "consensus"],
};

pub const SAFETY_OFFICER: Panelist = Panelist {
    name: "SafetyOfficer",
    bucket: "safety_concerns",
    system_message: "You are a safety officer for ConnectSphere. Monitor \
        platform safety and security, coordinate with content moderation, \
        identify and mitigate risks, and ensure user protection.",
    keywords: &["safety", "security", "moderation", "risk", "spam", "abuse", "protection"],
};

/// The full five-role panel, in round-robin order.
pub fn platform_panel() -> Vec<Panelist> {
    vec![
        CONTENT_STRATEGIST,
        UX_SPECIALIST,
        ECONOMIC_ANALYST,
        GOVERNANCE_COORDINATOR,
        SAFETY_OFFICER,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_buckets_are_distinct() {
        let panel = platform_panel();
        let mut buckets: Vec<&str> = panel.iter().map(|p| p.bucket).collect();
        buckets.sort();
        buckets.dedup();
        assert_eq!(buckets.len(), panel.len());
    }
}
