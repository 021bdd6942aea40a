//! Conditional commands attached to placeholders.
//!
//! `{{Key :on:command:scope}}` reads as "apply `command` to `scope` when the
//! value of `Key` is `on`". For example `{{Phone :empty:remove:row}}` drops the
//! whole row when no phone number was supplied.

use std::fmt;

/// Number of modifier parts a trigger consists of.
pub const TRIGGER_PARTS: usize = 3;

/// Condition under which a trigger fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOn {
    /// `:empty`: the resolved value is the empty string.
    Empty,
    /// `:value` or `:=`: a non-empty value was supplied.
    Value,
}

/// Action taken when a trigger fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerCommand {
    /// `:remove`: delete the scope node.
    Remove,
    /// `:clear`: empty the text of the scope node, keeping structure.
    Clear,
}

/// Document region a trigger command applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerScope {
    /// The text node holding the placeholder.
    Placeholder,
    /// Enclosing table cell.
    Cell,
    /// Enclosing table row, or paragraph outside tables.
    Row,
    /// Every paragraph of the enclosing list.
    List,
    /// Enclosing table.
    Table,
    /// Enclosing table, or the whole list when inside a list paragraph.
    Section,
}

/// Parsed `:on:command:scope` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    pub on: TriggerOn,
    pub command: TriggerCommand,
    pub scope: TriggerScope,
}

impl Trigger {
    /// Build a trigger from lowercased modifier parts.
    ///
    /// Exactly [`TRIGGER_PARTS`] recognized parts are required; anything else
    /// means the placeholder carries no trigger at all.
    pub fn from_parts<S: AsRef<str>>(parts: &[S]) -> Option<Self> {
        let [on, command, scope] = parts else {
            return None;
        };
        let trigger = Self {
            on: match on.as_ref() {
                "empty" => TriggerOn::Empty,
                "value" | "=" => TriggerOn::Value,
                _ => return None,
            },
            command: match command.as_ref() {
                "remove" => TriggerCommand::Remove,
                "clear" => TriggerCommand::Clear,
                _ => return None,
            },
            scope: match scope.as_ref() {
                "placeholder" => TriggerScope::Placeholder,
                "cell" => TriggerScope::Cell,
                "row" => TriggerScope::Row,
                "list" => TriggerScope::List,
                "table" => TriggerScope::Table,
                "section" => TriggerScope::Section,
                _ => return None,
            },
        };
        Some(trigger)
    }

    /// Whether the trigger fires for the resolved value.
    #[must_use]
    pub fn fires(&self, value: &str) -> bool {
        match self.on {
            TriggerOn::Empty => value.is_empty(),
            TriggerOn::Value => !value.is_empty(),
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let on = match self.on {
            TriggerOn::Empty => "empty",
            TriggerOn::Value => "=",
        };
        let command = match self.command {
            TriggerCommand::Remove => "remove",
            TriggerCommand::Clear => "clear",
        };
        let scope = match self.scope {
            TriggerScope::Placeholder => "placeholder",
            TriggerScope::Cell => "cell",
            TriggerScope::Row => "row",
            TriggerScope::List => "list",
            TriggerScope::Table => "table",
            TriggerScope::Section => "section",
        };
        write!(f, ":{on}:{command}:{scope}")
    }
}
