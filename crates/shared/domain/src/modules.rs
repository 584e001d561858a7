//! Module registry: the closed, ordered catalog of gateable product areas.
//!
//! Registry order is display order only. Nothing ranks one module above another.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Stable identifier of a product module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKey {
    Leads,
    Proposals,
    Clients,
    Tasks,
    Calendar,
    Financial,
    Reports,
    Whatsapp,
    Email,
    Team,
    Settings,
}

/// Number of modules in the registry.
pub const MODULE_COUNT: usize = 11;

impl ModuleKey {
    /// Every module key, in registry order.
    pub const ALL: [Self; MODULE_COUNT] = [
        Self::Leads,
        Self::Proposals,
        Self::Clients,
        Self::Tasks,
        Self::Calendar,
        Self::Financial,
        Self::Reports,
        Self::Whatsapp,
        Self::Email,
        Self::Team,
        Self::Settings,
    ];

    /// The wire identifier, identical to the serde representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Leads => "leads",
            Self::Proposals => "proposals",
            Self::Clients => "clients",
            Self::Tasks => "tasks",
            Self::Calendar => "calendar",
            Self::Financial => "financial",
            Self::Reports => "reports",
            Self::Whatsapp => "whatsapp",
            Self::Email => "email",
            Self::Team => "team",
            Self::Settings => "settings",
        }
    }

    /// The single-bit [`ModuleSet`] for this key.
    #[must_use]
    pub const fn flag(self) -> ModuleSet {
        ModuleSet::from_bits_retain(1 << self as u32)
    }

    /// Registry entry carrying the display metadata.
    #[must_use]
    pub fn module(self) -> &'static Module {
        &REGISTRY[self as usize]
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a registered module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownModuleKey(pub String);

impl fmt::Display for UnknownModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown module key '{}'", self.0)
    }
}

impl std::error::Error for UnknownModuleKey {}

impl FromStr for ModuleKey {
    type Err = UnknownModuleKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownModuleKey(s.to_owned()))
    }
}

/// Display metadata for a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Module {
    pub key: ModuleKey,
    pub label: &'static str,
    pub description: &'static str,
}

/// The module registry, indexed by `ModuleKey as usize`.
pub static REGISTRY: [Module; MODULE_COUNT] = [
    Module {
        key: ModuleKey::Leads,
        label: "Leads",
        description: "Capture inbound travel requests and move them through the sales pipeline",
    },
    Module {
        key: ModuleKey::Proposals,
        label: "Proposals",
        description: "Build itineraries and quotes, track proposal history and approvals",
    },
    Module {
        key: ModuleKey::Clients,
        label: "Clients",
        description: "Traveller and company records with trip history",
    },
    Module {
        key: ModuleKey::Tasks,
        label: "Tasks",
        description: "Follow-ups and to-dos assigned to agents, with SLA tracking",
    },
    Module {
        key: ModuleKey::Calendar,
        label: "Calendar",
        description: "Departures, returns, tasks and meetings on a shared agenda",
    },
    Module {
        key: ModuleKey::Financial,
        label: "Financial",
        description: "Receivables, payables and commission statements",
    },
    Module {
        key: ModuleKey::Reports,
        label: "Reports",
        description: "Sales funnel, conversion and agent performance dashboards",
    },
    Module {
        key: ModuleKey::Whatsapp,
        label: "WhatsApp",
        description: "Send proposals and reminders through the WhatsApp Cloud API",
    },
    Module {
        key: ModuleKey::Email,
        label: "Email",
        description: "Connected mailboxes and templated outbound email",
    },
    Module {
        key: ModuleKey::Team,
        label: "Team",
        description: "Invite agents and manage roles within the agency",
    },
    Module {
        key: ModuleKey::Settings,
        label: "Settings",
        description: "Agency profile, integrations and billing preferences",
    },
];

bitflags! {
    /// A set of modules. Bit `n` is `ModuleKey::ALL[n]`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct ModuleSet: u32 {
        const LEADS = 1 << ModuleKey::Leads as u32;
        const PROPOSALS = 1 << ModuleKey::Proposals as u32;
        const CLIENTS = 1 << ModuleKey::Clients as u32;
        const TASKS = 1 << ModuleKey::Tasks as u32;
        const CALENDAR = 1 << ModuleKey::Calendar as u32;
        const FINANCIAL = 1 << ModuleKey::Financial as u32;
        const REPORTS = 1 << ModuleKey::Reports as u32;
        const WHATSAPP = 1 << ModuleKey::Whatsapp as u32;
        const EMAIL = 1 << ModuleKey::Email as u32;
        const TEAM = 1 << ModuleKey::Team as u32;
        const SETTINGS = 1 << ModuleKey::Settings as u32;
    }
}

/// Outcome of tolerant parsing: the recognised modules plus whatever was not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedModules {
    pub set: ModuleSet,
    pub unknown: Vec<String>,
}

impl ModuleSet {
    /// Parses raw module identifiers, collecting unknown ones instead of failing.
    pub fn parse_keys<I, S>(keys: I) -> ParsedModules
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        keys.into_iter().fold(ParsedModules::default(), |mut parsed, raw| {
            match raw.as_ref().parse::<ModuleKey>() {
                Ok(key) => parsed.set |= key.flag(),
                Err(UnknownModuleKey(raw)) => parsed.unknown.push(raw),
            }
            parsed
        })
    }

    #[must_use]
    pub const fn has(self, key: ModuleKey) -> bool {
        self.contains(key.flag())
    }

    /// Keys in registry order.
    pub fn keys(self) -> impl Iterator<Item = ModuleKey> {
        ModuleKey::ALL.into_iter().filter(move |key| self.has(*key))
    }
}

impl FromIterator<ModuleKey> for ModuleSet {
    fn from_iter<T: IntoIterator<Item = ModuleKey>>(iter: T) -> Self {
        iter.into_iter().fold(Self::empty(), |set, key| set | key.flag())
    }
}

impl Default for ModuleSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl Serialize for ModuleSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.keys())
    }
}

impl<'de> Deserialize<'de> for ModuleSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Vec::<ModuleKey>::deserialize(deserializer)?.into_iter().collect())
    }
}
