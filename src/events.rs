//! Event bus
//!
//! String-named events carrying a key/value argument bag. UI and input code
//! fire commands such as `play level=2` or `save fileName=levels/a.xml`;
//! the game drains the queue once per frame and acts on them.
//!
//! Only subscribed names are queued. Firing an unsubscribed name is a
//! logged no-op, which keeps typos in console commands from piling up.

use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

/// Arguments of one event, keys compared case-insensitively.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventArgs {
    values: BTreeMap<String, String>,
}

impl EventArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style `set`.
    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl ToString) {
        self.values.insert(key.to_ascii_lowercase(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&key.to_ascii_lowercase()).map(String::as_str)
    }

    /// Raw value or the default.
    pub fn get_str<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Parsed value, or the default when missing or unparsable.
    pub fn get_parsed<T: FromStr>(&self, key: &str, default: T) -> T {
        self.get(key).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parse `key=value` pairs separated by whitespace. Values may be
    /// double-quoted to contain spaces. Bare words are stored with an empty
    /// value.
    pub fn parse(text: &str) -> Self {
        let mut args = EventArgs::new();
        for token in tokenize(text) {
            match token.split_once('=') {
                Some((k, v)) => args.set(k, v),
                None => args.set(&token, ""),
            }
        }
        args
    }
}

/// Split on whitespace, keeping double-quoted runs together (quotes removed).
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in text.chars() {
        match c {
            '"' => quoted = !quoted,
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// One fired event.
#[derive(Debug, Clone, PartialEq)]
pub struct GameEvent {
    pub name: String,
    pub args: EventArgs,
}

/// Split a command line into event name and arguments.
pub fn parse_command(line: &str) -> Option<GameEvent> {
    let line = line.trim();
    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest),
        None => (line, ""),
    };
    if name.is_empty() {
        return None;
    }
    Some(GameEvent { name: name.to_ascii_lowercase(), args: EventArgs::parse(rest) })
}

#[derive(Debug, Default)]
pub struct EventBus {
    subscribed: HashSet<String>,
    queue: Vec<GameEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, name: &str) {
        self.subscribed.insert(name.to_ascii_lowercase());
    }

    pub fn unsubscribe(&mut self, name: &str) {
        self.subscribed.remove(&name.to_ascii_lowercase());
    }

    pub fn is_subscribed(&self, name: &str) -> bool {
        self.subscribed.contains(&name.to_ascii_lowercase())
    }

    /// Queue an event. Returns false if nobody listens for `name`.
    pub fn fire(&mut self, name: &str, args: EventArgs) -> bool {
        let name = name.to_ascii_lowercase();
        if !self.subscribed.contains(&name) {
            log::debug!("event '{}' has no subscribers, dropped", name);
            return false;
        }
        self.queue.push(GameEvent { name, args });
        true
    }

    /// Parse and queue a command line such as `play level=1`.
    pub fn fire_command(&mut self, line: &str) -> bool {
        match parse_command(line) {
            Some(event) => self.fire(&event.name, event.args),
            None => false,
        }
    }

    /// Take every queued event, oldest first.
    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.queue)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        let e = parse_command("  Play level=2 ").unwrap();
        assert_eq!(e.name, "play");
        assert_eq!(e.args.get_parsed("level", 0usize), 2);
        assert_eq!(e.args.get_parsed("LEVEL", 0usize), 2);
        assert!(parse_command("   ").is_none());
    }

    #[test]
    fn test_quoted_values_and_defaults() {
        let args = EventArgs::parse(r#"fileName="my levels/a.xml" fast"#);
        assert_eq!(args.get_str("filename", ""), "my levels/a.xml");
        assert_eq!(args.get("fast"), Some(""));
        assert_eq!(args.get_parsed("level", 7), 7);
        assert_eq!(args.get_parsed::<f32>("filename", 1.0), 1.0);
    }

    #[test]
    fn test_only_subscribed_events_queue() {
        let mut bus = EventBus::new();
        assert!(!bus.fire("quit", EventArgs::new()));
        bus.subscribe("Quit");
        assert!(bus.fire_command("QUIT"));
        assert!(bus.fire("quit", EventArgs::new().with("now", true)));
        assert_eq!(bus.len(), 2);

        let events = bus.drain();
        assert_eq!(events[1].args.get("now"), Some("true"));
        assert!(bus.is_empty());

        bus.unsubscribe("quit");
        assert!(!bus.fire_command("quit"));
    }
}
