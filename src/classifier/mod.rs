//! Prompt intent/risk classification for the prompt-submission hook.
//!
//! [`assess`] scores a prompt against independent keyword sets (intents,
//! domains) and two boolean signal groups (complexity, risk). [`advise`]
//! walks a fixed priority table over that assessment and keeps at most
//! [`MAX_ADVISORIES`] entries.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Advisory lines surfaced per prompt. Later entries are dropped.
pub const MAX_ADVISORIES: usize = 3;

/// Signals needed for complexity or risk to count as high.
const HIGH_THRESHOLD: usize = 2;

/// Prompts longer than this (in characters) count as a complexity signal.
const LONG_PROMPT_CHARS: usize = 400;

/// More mentioned files than this count as a multi-file signal.
const MANY_FILES: usize = 3;

// ===================================================================
// Labels
// ===================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Intent {
    Create,
    Fix,
    Review,
    Refactor,
    Test,
    Deploy,
    Delete,
    Migrate,
    Security,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Domain {
    Frontend,
    Backend,
    Database,
    Auth,
    Infra,
    Git,
}

fn keywords(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid keyword pattern {pattern:?}: {e}"))
}

static INTENTS: LazyLock<Vec<(Intent, Regex)>> = LazyLock::new(|| {
    vec![
        (
            Intent::Create,
            keywords(r"\b(create|add|new|build|implement|make|scaffold|generate|생성|추가|만들|구현|작성)\b"),
        ),
        (
            Intent::Fix,
            keywords(r"\b(fix|bug|error|broken|crash|debug|patch|hotfix|수정|버그|오류|에러|고치|패치)\b"),
        ),
        (
            Intent::Review,
            keywords(r"\b(review|check|audit|inspect|analyze|리뷰|검토|검사|확인|분석)\b"),
        ),
        (
            Intent::Refactor,
            keywords(r"\b(refactor|clean|improve|optimize|simplify|restructure|리팩|개선|최적화|정리|단순화)\b"),
        ),
        (
            Intent::Test,
            keywords(r"\b(test|spec|coverage|vitest|jest|playwright|pytest|테스트|검증|커버리지)\b"),
        ),
        (
            Intent::Deploy,
            keywords(r"\b(deploy|release|publish|ci|cd|배포|릴리즈|퍼블리시)\b"),
        ),
        (
            Intent::Delete,
            keywords(r"\b(delete|remove|drop|clean\s*up|삭제|제거|정리)\b"),
        ),
        (
            Intent::Migrate,
            keywords(r"\b(migrate|migration|upgrade|update\s+version|마이그레이션|업그레이드)\b"),
        ),
        (
            Intent::Security,
            keywords(r"\b(security|auth|vulnerability|cve|xss|sql\s*inject|csrf|보안|취약점)\b"),
        ),
    ]
});

static DOMAINS: LazyLock<Vec<(Domain, Regex)>> = LazyLock::new(|| {
    vec![
        (
            Domain::Frontend,
            keywords(r"\b(react|vue|angular|svelte|component|css|html|jsx|tsx|style|ui|ux|hook|state|render|프론트|컴포넌트|스타일)\b"),
        ),
        (
            Domain::Backend,
            keywords(r"\b(api|server|endpoint|controller|service|middleware|nest|express|fastify|route|handler|백엔드|서버)\b"),
        ),
        (
            Domain::Database,
            keywords(r"\b(database|db|sql|prisma|schema|migration|query|table|model|orm|seed|데이터베이스|스키마|테이블)\b"),
        ),
        (
            Domain::Auth,
            keywords(r"\b(auth|login|jwt|session|token|password|oauth|permission|role|guard|인증|로그인|권한)\b"),
        ),
        (
            Domain::Infra,
            keywords(r"\b(docker|k8s|kubernetes|nginx|deploy|ci|cd|pipeline|terraform|aws|gcp|azure|인프라|배포)\b"),
        ),
        (
            Domain::Git,
            keywords(r"\b(git|commit|branch|merge|pr|pull\s*request|rebase|cherry|stash|커밋|브랜치|머지)\b"),
        ),
    ]
});

static MENTIONED_FILE: LazyLock<Regex> = LazyLock::new(|| {
    keywords(r"[\w\-/.\\]+\.(ts|tsx|js|jsx|css|md|json|py|go|rs|java|sql|yaml|yml|toml|prisma|vue|svelte)\b")
});

static BROAD_SCOPE: LazyLock<Regex> =
    LazyLock::new(|| keywords(r"\b(all|every|entire|across|multiple|전체|모든|여러)\b"));
static ARCHITECTURAL: LazyLock<Regex> = LazyLock::new(|| {
    keywords(r"\b(architect|redesign|restructure|migrate|monorepo|아키텍|설계|구조)\b")
});
static FULL_STACK: LazyLock<Regex> =
    LazyLock::new(|| keywords(r"\b(full.?stack|end.?to.?end|풀스택)\b"));
static SEQUENCING: LazyLock<Regex> = LazyLock::new(|| {
    keywords(r"\b(then|after|next|and\s+also|first.*then|그리고|다음|먼저.*그다음)\b")
});
static GLOBAL_SCOPE: LazyLock<Regex> =
    LazyLock::new(|| keywords(r"\b(global|every|all\s+files|전역|전체\s+파일)\b"));

// ===================================================================
// Assessment
// ===================================================================

/// One named boolean signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    pub name: &'static str,
    pub active: bool,
}

/// A group of signals with a "high when at least N are active" rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Score {
    pub signals: Vec<Signal>,
}

impl Score {
    pub fn count(&self) -> usize {
        self.signals.iter().filter(|s| s.active).count()
    }

    pub fn is_high(&self) -> bool {
        self.count() >= HIGH_THRESHOLD
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.signals.iter().any(|s| s.name == name && s.active)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub intents: BTreeSet<Intent>,
    pub domains: BTreeSet<Domain>,
    pub mentioned_files: Vec<String>,
    pub complexity: Score,
    pub risk: Score,
}

impl Assessment {
    pub fn has_intent(&self, intent: Intent) -> bool {
        self.intents.contains(&intent)
    }

    pub fn has_domain(&self, domain: Domain) -> bool {
        self.domains.contains(&domain)
    }
}

/// Score a free-text prompt.
pub fn assess(prompt: &str) -> Assessment {
    let lower = prompt.to_lowercase();

    let intents: BTreeSet<Intent> = INTENTS
        .iter()
        .filter(|(_, re)| re.is_match(&lower))
        .map(|(intent, _)| *intent)
        .collect();
    let domains: BTreeSet<Domain> = DOMAINS
        .iter()
        .filter(|(_, re)| re.is_match(&lower))
        .map(|(domain, _)| *domain)
        .collect();

    let mut mentioned_files: Vec<String> = Vec::new();
    for m in MENTIONED_FILE.find_iter(prompt) {
        if !mentioned_files.iter().any(|f| f == m.as_str()) {
            mentioned_files.push(m.as_str().to_string());
        }
    }

    let complexity = Score {
        signals: vec![
            Signal {
                name: "multi-file",
                active: mentioned_files.len() > MANY_FILES || BROAD_SCOPE.is_match(&lower),
            },
            Signal {
                name: "architectural",
                active: ARCHITECTURAL.is_match(&lower),
            },
            Signal {
                name: "cross-cutting",
                active: domains.len() >= 2 || FULL_STACK.is_match(&lower),
            },
            Signal {
                name: "long-prompt",
                active: prompt.chars().count() > LONG_PROMPT_CHARS,
            },
            Signal {
                name: "multi-step",
                active: SEQUENCING.is_match(&lower),
            },
        ],
    };

    let risk = Score {
        signals: vec![
            Signal {
                name: "deletion",
                active: intents.contains(&Intent::Delete),
            },
            Signal {
                name: "database",
                active: domains.contains(&Domain::Database),
            },
            Signal {
                name: "auth",
                active: domains.contains(&Domain::Auth) || intents.contains(&Intent::Security),
            },
            Signal {
                name: "deploy",
                active: intents.contains(&Intent::Deploy),
            },
            Signal {
                name: "migration",
                active: intents.contains(&Intent::Migrate),
            },
            Signal {
                name: "global",
                active: GLOBAL_SCOPE.is_match(&lower),
            },
        ],
    };

    Assessment {
        intents,
        domains,
        mentioned_files,
        complexity,
        risk,
    }
}

// ===================================================================
// Advisories
// ===================================================================

struct AdvisoryRule {
    applies: fn(&Assessment) -> bool,
    text: &'static str,
}

fn complex(a: &Assessment) -> bool {
    a.complexity.is_high()
}

fn risky(a: &Assessment) -> bool {
    a.risk.is_high()
}

fn refactoring(a: &Assessment) -> bool {
    a.has_intent(Intent::Refactor)
}

fn fixing(a: &Assessment) -> bool {
    a.has_intent(Intent::Fix)
}

fn deleting(a: &Assessment) -> bool {
    a.has_intent(Intent::Delete)
}

fn migrating(a: &Assessment) -> bool {
    a.has_intent(Intent::Migrate)
}

fn touches_database(a: &Assessment) -> bool {
    a.risk.is_active("database")
}

fn touches_auth(a: &Assessment) -> bool {
    a.risk.is_active("auth")
}

fn untested_change(a: &Assessment) -> bool {
    (a.has_intent(Intent::Create) || a.has_intent(Intent::Fix)) && !a.has_intent(Intent::Test)
}

/// Every advisory in priority order. [`advise`] keeps the first
/// [`MAX_ADVISORIES`] that apply.
static ADVISORIES: &[AdvisoryRule] = &[
    AdvisoryRule {
        applies: complex,
        text: "[Context] Complex task detected (multi-file/cross-domain/multi-step). \
               Consider: 1) Use EnterPlanMode to design approach first. \
               2) Break into smaller atomic changes. \
               3) Verify each step before proceeding.",
    },
    AdvisoryRule {
        applies: risky,
        text: "[Risk] High-risk operation detected. \
               Ensure: 1) Current state is committed/stashed. \
               2) Changes are reversible. \
               3) Run relevant tests after each change.",
    },
    AdvisoryRule {
        applies: refactoring,
        text: "[Refactor Protocol] \
               1) Run tests BEFORE refactoring to establish baseline. \
               2) Make one structural change at a time. \
               3) Run tests AFTER each change. \
               4) Keep behavior identical — no feature changes during refactor.",
    },
    AdvisoryRule {
        applies: fixing,
        text: "[Debug Protocol] \
               1) Reproduce the bug first. \
               2) Read the relevant code (don't guess). \
               3) Fix root cause, not symptom. \
               4) Add a test that catches this bug.",
    },
    AdvisoryRule {
        applies: deleting,
        text: "[Deletion Safety] \
               Before deleting: check all imports/references to the target. \
               Use Grep to find dependents. Confirm with user before removing.",
    },
    AdvisoryRule {
        applies: migrating,
        text: "[Migration Protocol] \
               1) Back up current state. \
               2) Create migration plan with rollback steps. \
               3) Test migration on isolated branch. \
               4) Verify data integrity after migration.",
    },
    AdvisoryRule {
        applies: touches_database,
        text: "[DB Safety] \
               Schema changes require migration files. \
               Never modify production data directly. \
               Test with seed data first.",
    },
    AdvisoryRule {
        applies: touches_auth,
        text: "[Security] \
               No hardcoded secrets. Use env vars. \
               Validate all inputs at boundaries. \
               Check OWASP Top 10 compliance.",
    },
    AdvisoryRule {
        applies: untested_change,
        text: "[Quality] Remember to add/update tests for your changes.",
    },
];

/// Every advisory that applies, uncapped, in priority order.
pub fn qualifying(assessment: &Assessment) -> Vec<&'static str> {
    ADVISORIES
        .iter()
        .filter(|rule| (rule.applies)(assessment))
        .map(|rule| rule.text)
        .collect()
}

/// The advisories to surface: [`qualifying`] truncated to [`MAX_ADVISORIES`].
pub fn advise(assessment: &Assessment) -> Vec<&'static str> {
    let mut advisories = qualifying(assessment);
    advisories.truncate(MAX_ADVISORIES);
    advisories
}
