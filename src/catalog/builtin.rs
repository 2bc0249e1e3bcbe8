//! Built-in scam pattern catalog.
//!
//! Eight vishing patterns covering the schemes most commonly run against
//! enterprise employees. Ids are stable; the scripted demo call refers to
//! pattern "2" (IT Support Credential Harvesting) by id.

use super::{PatternDefinition, Severity};

fn pattern(
    id: &str,
    name: &str,
    description: &str,
    severity: Severity,
    keywords: &[&str],
    phrases: &[&str],
) -> PatternDefinition {
    PatternDefinition {
        id: id.into(),
        name: name.into(),
        description: description.into(),
        severity,
        keywords: keywords.iter().map(|s| s.to_string()).collect(),
        phrases: phrases.iter().map(|s| s.to_string()).collect(),
    }
}

/// The default pattern set, in catalog order.
pub fn patterns() -> Vec<PatternDefinition> {
    vec![
        // 1. Executive impersonation for fraudulent transfers
        pattern(
            "1",
            "CEO Fraud / Executive Impersonation",
            "Attacker impersonates company executive to authorize fraudulent wire transfers or request sensitive information.",
            Severity::Critical,
            &[
                "urgent",
                "wire transfer",
                "confidential",
                "CEO",
                "president",
                "executive",
                "immediate",
                "ASAP",
            ],
            &[
                "need this right away",
                "wire the money",
                "don't tell anyone",
                "this is urgent",
                "handle this personally",
                "send the payment now",
                "I need you to do something",
                "keep this between us",
            ],
        ),
        // 2. Fake IT support harvesting credentials
        pattern(
            "2",
            "IT Support Credential Harvesting",
            "Scammer poses as IT support to collect usernames, passwords, or remote access credentials.",
            Severity::Critical,
            &[
                "password",
                "IT support",
                "security update",
                "verify account",
                "reset password",
                "login credentials",
                "remote access",
                "TeamViewer",
                "AnyDesk",
            ],
            &[
                "verify your password",
                "need to verify your account",
                "security breach",
                "your account has been compromised",
                "need your login",
                "reset your password",
                "install this software",
                "give me remote access",
                "what's your current password",
            ],
        ),
        // 3. Manufactured urgency around account status
        pattern(
            "3",
            "Urgent Account Verification",
            "Creates false urgency claiming account issues require immediate verification of personal information.",
            Severity::High,
            &[
                "verify",
                "suspended",
                "locked",
                "unusual activity",
                "security alert",
                "confirm",
                "validate",
                "account",
            ],
            &[
                "your account will be suspended",
                "unusual activity detected",
                "verify your identity",
                "confirm your information",
                "account has been locked",
                "need to verify you",
                "security alert on your account",
                "click this link to verify",
            ],
        ),
        // 4. Tax authority threats demanding payment
        pattern(
            "4",
            "Tax/IRS Impersonation",
            "Impersonates tax authorities to threaten legal action and demand immediate payment.",
            Severity::High,
            &[
                "IRS",
                "tax",
                "arrest",
                "warrant",
                "legal action",
                "lawsuit",
                "police",
                "investigation",
            ],
            &[
                "you owe back taxes",
                "warrant for your arrest",
                "legal action will be taken",
                "this is the IRS",
                "final notice",
                "pay immediately",
                "avoid prosecution",
                "police will come",
            ],
        ),
        // 5. Fake virus warnings selling remote "help"
        pattern(
            "5",
            "Tech Support Scam",
            "Claims computer has virus or security issue and offers fake tech support services.",
            Severity::Medium,
            &[
                "virus",
                "malware",
                "infected",
                "tech support",
                "Microsoft",
                "Windows",
                "Apple",
                "security",
                "firewall",
            ],
            &[
                "your computer is infected",
                "detected a virus",
                "calling from Microsoft",
                "security breach detected",
                "your firewall is down",
                "need to fix your computer",
                "install this protection",
                "your warranty is expiring",
            ],
        ),
        // 6. Fake HR collecting SSNs and banking details
        pattern(
            "6",
            "HR/Benefits Verification",
            "Poses as HR to collect Social Security numbers, bank details for direct deposit, or other PII.",
            Severity::Critical,
            &[
                "HR",
                "human resources",
                "benefits",
                "payroll",
                "W2",
                "direct deposit",
                "social security",
                "SSN",
                "tax form",
            ],
            &[
                "verify your social security",
                "update payroll information",
                "need your SSN",
                "confirm your direct deposit",
                "benefits enrollment",
                "update your W2",
                "verify your bank account",
                "need your date of birth",
            ],
        ),
        // 7. Payment redirection via fake vendor banking changes
        pattern(
            "7",
            "Vendor Invoice Fraud",
            "Impersonates known vendor to redirect payments to fraudulent accounts.",
            Severity::High,
            &[
                "invoice",
                "payment",
                "vendor",
                "supplier",
                "account change",
                "bank details",
                "wire instructions",
                "routing number",
            ],
            &[
                "updated our bank details",
                "new payment instructions",
                "change our account information",
                "please update your records",
                "send payment to new account",
                "our banking information changed",
                "use this routing number",
                "invoice needs to be paid",
            ],
        ),
        // 8. Fake family/colleague emergencies demanding money
        pattern(
            "8",
            "Emergency Scam",
            "Creates fake emergency scenario involving family member or colleague to pressure immediate action.",
            Severity::High,
            &[
                "emergency",
                "accident",
                "hospital",
                "arrested",
                "stranded",
                "urgent help",
                "family member",
                "bail",
            ],
            &[
                "family emergency",
                "been in an accident",
                "need money right away",
                "send cash immediately",
                "don't tell anyone",
                "stranded abroad",
                "need bail money",
                "please help me",
            ],
        ),
    ]
}
