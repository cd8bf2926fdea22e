//! Operator input forms: server registrar and command dispatcher
//!
//! Both forms validate by suppression: a missing required field makes
//! `submit` a silent no-op that performs no network call and leaves every
//! input untouched.

use fleetdash_client::{CommandRequest, CreateServer};
use fleetdash_core::TargetType;

/// Fields of the registration form, in focus order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterField {
    Hostname,
    Ip,
    Group,
}

/// Server registration form
#[derive(Debug)]
pub struct RegisterForm {
    pub hostname: String,
    pub ip: String,
    pub group: String,
    pub field: RegisterField,
}

impl RegisterForm {
    pub fn new() -> Self {
        Self {
            hostname: String::new(),
            ip: String::new(),
            group: String::new(),
            field: RegisterField::Hostname,
        }
    }

    pub fn next_field(&mut self) {
        self.field = match self.field {
            RegisterField::Hostname => RegisterField::Ip,
            RegisterField::Ip => RegisterField::Group,
            RegisterField::Group => RegisterField::Hostname,
        };
    }

    pub fn prev_field(&mut self) {
        self.field = match self.field {
            RegisterField::Hostname => RegisterField::Group,
            RegisterField::Ip => RegisterField::Hostname,
            RegisterField::Group => RegisterField::Ip,
        };
    }

    pub fn input(&mut self, c: char) {
        self.active_field_mut().push(c);
    }

    pub fn backspace(&mut self) {
        self.active_field_mut().pop();
    }

    fn active_field_mut(&mut self) -> &mut String {
        match self.field {
            RegisterField::Hostname => &mut self.hostname,
            RegisterField::Ip => &mut self.ip,
            RegisterField::Group => &mut self.group,
        }
    }

    /// Build the registration payload. A hostname that is empty after
    /// trimming suppresses the action: no payload, inputs untouched.
    /// Otherwise all three inputs are cleared.
    pub fn submit(&mut self) -> Option<CreateServer> {
        let hostname = self.hostname.trim().to_string();
        if hostname.is_empty() {
            return None;
        }
        let ip = self.ip.trim().to_string();
        let group = self.group.trim().to_string();
        self.hostname.clear();
        self.ip.clear();
        self.group.clear();
        Some(CreateServer {
            hostname,
            ip: (!ip.is_empty()).then_some(ip),
            group: (!group.is_empty()).then_some(group),
        })
    }
}

impl Default for RegisterForm {
    fn default() -> Self {
        Self::new()
    }
}

/// Text fields of the dispatch form, in focus order (the target type is a
/// selector, cycled separately)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandField {
    Target,
    Command,
    Timeout,
    User,
}

/// Command dispatch form
#[derive(Debug)]
pub struct CommandForm {
    pub target_type: TargetType,
    pub target: String,
    pub command: String,
    pub timeout: String,
    pub user: String,
    pub field: CommandField,
}

impl CommandForm {
    pub fn new() -> Self {
        Self {
            target_type: TargetType::Node,
            target: String::new(),
            command: String::new(),
            timeout: String::new(),
            user: String::new(),
            field: CommandField::Command,
        }
    }

    pub fn cycle_target_type(&mut self) {
        self.target_type = self.target_type.next();
    }

    pub fn next_field(&mut self) {
        self.field = match self.field {
            CommandField::Target => CommandField::Command,
            CommandField::Command => CommandField::Timeout,
            CommandField::Timeout => CommandField::User,
            CommandField::User => CommandField::Target,
        };
    }

    pub fn prev_field(&mut self) {
        self.field = match self.field {
            CommandField::Target => CommandField::User,
            CommandField::Command => CommandField::Target,
            CommandField::Timeout => CommandField::Command,
            CommandField::User => CommandField::Timeout,
        };
    }

    pub fn input(&mut self, c: char) {
        self.active_field_mut().push(c);
    }

    pub fn backspace(&mut self) {
        self.active_field_mut().pop();
    }

    fn active_field_mut(&mut self) -> &mut String {
        match self.field {
            CommandField::Target => &mut self.target,
            CommandField::Command => &mut self.command,
            CommandField::Timeout => &mut self.timeout,
            CommandField::User => &mut self.user,
        }
    }

    /// Build the dispatch payload. An empty command suppresses the action.
    /// Only the command text clears afterwards; target, target type,
    /// timeout, and user persist for repeated dispatch to the same target.
    pub fn submit(&mut self) -> Option<CommandRequest> {
        let command = self.command.trim().to_string();
        if command.is_empty() {
            return None;
        }
        let target = self.target.trim().to_string();
        let user = self.user.trim().to_string();
        let request = CommandRequest {
            target_type: self.target_type,
            target: (!target.is_empty()).then_some(target),
            command,
            timeout: parse_timeout(&self.timeout),
            user: (!user.is_empty()).then_some(user),
        };
        self.command.clear();
        Some(request)
    }
}

impl Default for CommandForm {
    fn default() -> Self {
        Self::new()
    }
}

/// Timeout in seconds; unparsable or zero input falls back to the 30s
/// default (a literal 0 counts as "unset", not as an instant timeout)
fn parse_timeout(input: &str) -> u64 {
    match input.trim().parse::<u64>() {
        Ok(0) | Err(_) => 30,
        Ok(timeout) => timeout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_hostname_suppresses_registration() {
        let mut form = RegisterForm::new();
        form.hostname = "   ".to_string();
        form.ip = "10.0.0.5".to_string();

        assert!(form.submit().is_none());
        // Inputs stay untouched on a suppressed submit
        assert_eq!(form.hostname, "   ");
        assert_eq!(form.ip, "10.0.0.5");
    }

    #[test]
    fn test_registration_clears_inputs_and_nulls_blanks() {
        let mut form = RegisterForm::new();
        form.hostname = " node-1 ".to_string();
        form.ip = "10.0.0.5".to_string();

        let payload = form.submit().unwrap();
        assert_eq!(payload.hostname, "node-1");
        assert_eq!(payload.ip.as_deref(), Some("10.0.0.5"));
        assert_eq!(payload.group, None);

        assert!(form.hostname.is_empty());
        assert!(form.ip.is_empty());
        assert!(form.group.is_empty());
    }

    #[test]
    fn test_empty_command_suppresses_dispatch() {
        let mut form = CommandForm::new();
        form.target_type = TargetType::Group;
        form.target = "web".to_string();
        form.command = "  ".to_string();

        assert!(form.submit().is_none());
        assert_eq!(form.target, "web");
        assert_eq!(form.target_type, TargetType::Group);
    }

    #[test]
    fn test_dispatch_clears_only_the_command() {
        let mut form = CommandForm::new();
        form.target_type = TargetType::Group;
        form.target = "web".to_string();
        form.command = "uptime".to_string();
        form.timeout = "60".to_string();
        form.user = "deploy".to_string();

        let request = form.submit().unwrap();
        assert_eq!(request.command, "uptime");
        assert_eq!(request.target.as_deref(), Some("web"));
        assert_eq!(request.timeout, 60);
        assert_eq!(request.user.as_deref(), Some("deploy"));

        assert!(form.command.is_empty());
        assert_eq!(form.target, "web");
        assert_eq!(form.timeout, "60");
        assert_eq!(form.user, "deploy");
    }

    #[test]
    fn test_fleet_wide_dispatch_sends_null_target() {
        let mut form = CommandForm::new();
        form.target_type = TargetType::All;
        form.command = "uptime".to_string();
        form.timeout = "0".to_string();

        let request = form.submit().unwrap();
        assert_eq!(request.target, None);
        assert_eq!(request.user, None);
        // A zero timeout counts as unset
        assert_eq!(request.timeout, 30);
    }

    #[test]
    fn test_timeout_coercion() {
        assert_eq!(parse_timeout(""), 30);
        assert_eq!(parse_timeout("0"), 30);
        assert_eq!(parse_timeout("abc"), 30);
        assert_eq!(parse_timeout("-5"), 30);
        assert_eq!(parse_timeout(" 45 "), 45);
    }

    #[test]
    fn test_target_type_cycles_through_all_selectors() {
        let mut form = CommandForm::new();
        assert_eq!(form.target_type, TargetType::Node);
        form.cycle_target_type();
        assert_eq!(form.target_type, TargetType::Group);
        form.cycle_target_type();
        assert_eq!(form.target_type, TargetType::All);
        form.cycle_target_type();
        assert_eq!(form.target_type, TargetType::Node);
    }
}
