//! # Console Harness
//!
//! Drives the plugin against an [`InMemoryWorld`] from a line-oriented
//! console, so the whole feature can be exercised without a game server.
//! Host events the console causes (joins, quits, world changes, permission
//! edits) are forwarded to the plugin the way a real host would. A player
//! who rejoins under the same name keeps their id and permission nodes.
//!
//! Everything meant for the operator, including what players would see in
//! chat or on their bar, is sent through one channel and printed in order.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use dashmap::DashMap;
use near_core::host::memory::InMemoryWorld;
use near_core::host::{BarColor, BarStyle, ChatLine, Display, Presence, Segment};
use near_core::{Location, PlayerId, PlayerSnapshot, Position};
use near_plugin::{NearPlugin, Sender};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

const HELP: &[&str] = &[
    "join <name> [world] [x] [z]     add a player",
    "quit <name>                     remove a player",
    "move <name> <x> <z> [yaw]       move within the current world",
    "tp <name> <world> <x> <z>       move to another world",
    "grant <name> <node>             give a permission node",
    "revoke <name> <node>            take a permission node",
    "group <name> <group|none>       set the primary group",
    "op <name> [on|off]              set operator status",
    "vanish <name> [on|off]          set invisibility",
    "as <name|console> <command...>  run a command as someone",
    "tab <name> <command...>         show completions for a command line",
    "players                         list online players",
    "wait <ms>                       let trackers run",
    "reload                          reload the configuration file",
    "help                            show this list",
    "exit                            shut down",
];

const SPAWN_Y: f64 = 64.0;

/// What the console should do after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

fn player_name(world: &InMemoryWorld, id: PlayerId) -> String {
    world
        .player(id)
        .map(|p| p.name)
        .unwrap_or_else(|| id.to_string())
}

// ============================================================================
// Display
// ============================================================================

/// Prints what each player would see.
///
/// Bar updates are only printed when the title changes, otherwise every
/// tick would produce a line.
pub struct ConsoleDisplay {
    world: Arc<InMemoryWorld>,
    out: UnboundedSender<String>,
    titles: DashMap<PlayerId, String>,
}

impl ConsoleDisplay {
    pub fn new(world: Arc<InMemoryWorld>, out: UnboundedSender<String>) -> Self {
        Self {
            world,
            out,
            titles: DashMap::new(),
        }
    }

    fn emit(&self, text: String) {
        // The receiver only goes away during shutdown.
        let _ = self.out.send(text);
    }
}

/// Buttons are shown as `text <command>`.
pub fn render_line(line: &ChatLine) -> String {
    line.segments
        .iter()
        .map(|segment| match segment {
            Segment::Text(text) => text.clone(),
            Segment::Button { text, command, .. } => format!("{text} <{command}>"),
        })
        .collect()
}

impl Display for ConsoleDisplay {
    fn send_line(&self, viewer: PlayerId, line: ChatLine) {
        let name = player_name(&self.world, viewer);
        self.emit(format!("[{name}] {}", render_line(&line)));
    }

    fn play_sound(&self, viewer: PlayerId, sound: &str, volume: f32, pitch: f32) {
        debug!(
            "🔊 {} hears {} (volume {}, pitch {})",
            player_name(&self.world, viewer),
            sound,
            volume,
            pitch
        );
    }

    fn show_bar(&self, viewer: PlayerId, color: BarColor, style: BarStyle) {
        self.titles.remove(&viewer);
        let name = player_name(&self.world, viewer);
        self.emit(format!("[{name} bar] shown ({color:?}, {style:?})"));
    }

    fn update_bar(&self, viewer: PlayerId, title: &str, progress: f64) {
        let changed = self
            .titles
            .insert(viewer, title.to_string())
            .map_or(true, |previous| previous != title);
        if changed {
            let name = player_name(&self.world, viewer);
            self.emit(format!(
                "[{name} bar] {title} ({:.0}%)",
                progress * 100.0
            ));
        }
    }

    fn clear_bar(&self, viewer: PlayerId) {
        self.titles.remove(&viewer);
        let name = player_name(&self.world, viewer);
        self.emit(format!("[{name} bar] cleared"));
    }
}

// ============================================================================
// Console
// ============================================================================

pub struct Console {
    world: Arc<InMemoryWorld>,
    plugin: Arc<NearPlugin>,
    out: UnboundedSender<String>,
    /// Lowercase name → id of every player seen so far.
    known: DashMap<String, PlayerId>,
}

impl Console {
    pub fn new(
        world: Arc<InMemoryWorld>,
        plugin: Arc<NearPlugin>,
        out: UnboundedSender<String>,
    ) -> Self {
        Self {
            world,
            plugin,
            out,
            known: DashMap::new(),
        }
    }

    /// Reads lines until `exit` or end of input.
    pub async fn run<R>(&self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        self.say("Type 'help' for the list of console commands.");
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            match self.execute(&line).await {
                Ok(Flow::Exit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => self.say(format!("❌ {e:#}")),
            }
        }
        Ok(())
    }

    /// Runs one console line.
    pub async fn execute(&self, line: &str) -> Result<Flow> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&verb, args)) = words.split_first() else {
            return Ok(Flow::Continue);
        };

        match verb.to_ascii_lowercase().as_str() {
            "join" => self.join(args)?,
            "quit" => self.quit(args)?,
            "move" => self.move_player(args)?,
            "tp" => self.teleport(args)?,
            "grant" => self.grant(args)?,
            "revoke" => self.revoke(args)?,
            "group" => self.group(args)?,
            "op" => self.operator(args)?,
            "vanish" => self.vanish(args)?,
            "as" => self.run_as(args)?,
            "tab" => self.tab(args)?,
            "players" => self.players(),
            "wait" => self.wait(args).await?,
            "reload" => self.reload(),
            "help" => HELP.iter().for_each(|line| self.say(*line)),
            "exit" | "stop" => return Ok(Flow::Exit),
            other => bail!("Unknown console command '{other}', try 'help'"),
        }
        Ok(Flow::Continue)
    }

    fn say(&self, text: impl Into<String>) {
        let _ = self.out.send(text.into());
    }

    fn online(&self, name: &str) -> Result<PlayerSnapshot> {
        self.world
            .player_by_name(name)
            .ok_or_else(|| anyhow!("{name} is not online"))
    }

    fn join(&self, args: &[&str]) -> Result<()> {
        let [name, rest @ ..] = args else {
            bail!("Usage: join <name> [world] [x] [z]");
        };
        if self.world.player_by_name(name).is_some() {
            bail!("{name} is already online");
        }
        let world = rest.first().copied().unwrap_or("world");
        let x = rest.get(1).map(|v| number(v)).transpose()?.unwrap_or(0.0);
        let z = rest.get(2).map(|v| number(v)).transpose()?.unwrap_or(0.0);

        let id = *self
            .known
            .entry(name.to_ascii_lowercase())
            .or_insert_with(PlayerId::new);
        self.world.join_with_id(
            id,
            *name,
            Location::new(world, Position::new(x, SPAWN_Y, z), 0.0),
        );
        self.plugin.on_player_join(id);
        self.say(format!("➕ {name} joined {world} at ({x}, {z})"));
        Ok(())
    }

    fn quit(&self, args: &[&str]) -> Result<()> {
        let [name] = args else {
            bail!("Usage: quit <name>");
        };
        let player = self.online(name)?;
        self.world.quit(player.id);
        self.plugin.on_player_quit(player.id);
        self.say(format!("➖ {} left", player.name));
        Ok(())
    }

    fn move_player(&self, args: &[&str]) -> Result<()> {
        let [name, x, z, rest @ ..] = args else {
            bail!("Usage: move <name> <x> <z> [yaw]");
        };
        let player = self.online(name)?;
        let yaw = match rest.first() {
            Some(yaw) => number(yaw)? as f32,
            None => player.location.yaw,
        };
        let location = Location::new(
            player.location.world.clone(),
            Position::new(number(x)?, player.location.position.y, number(z)?),
            yaw,
        );
        self.world.move_to(player.id, location);
        Ok(())
    }

    fn teleport(&self, args: &[&str]) -> Result<()> {
        let [name, world, x, z] = args else {
            bail!("Usage: tp <name> <world> <x> <z>");
        };
        let player = self.online(name)?;
        let location = Location::new(
            *world,
            Position::new(number(x)?, player.location.position.y, number(z)?),
            player.location.yaw,
        );
        self.world.move_to(player.id, location);
        self.plugin
            .on_world_change(player.id, &player.location.world, world);
        Ok(())
    }

    fn grant(&self, args: &[&str]) -> Result<()> {
        let [name, node] = args else {
            bail!("Usage: grant <name> <node>");
        };
        let player = self.online(name)?;
        self.world.grant(player.id, *node);
        self.plugin.on_permission_granted(player.id, node);
        self.say(format!("🔑 {} now has {node}", player.name));
        Ok(())
    }

    fn revoke(&self, args: &[&str]) -> Result<()> {
        let [name, node] = args else {
            bail!("Usage: revoke <name> <node>");
        };
        let player = self.online(name)?;
        if !self.world.revoke(player.id, node) {
            bail!("{} does not have {node}", player.name);
        }
        self.plugin.on_permission_revoked(player.id, node);
        self.say(format!("🔒 {} no longer has {node}", player.name));
        Ok(())
    }

    fn group(&self, args: &[&str]) -> Result<()> {
        let [name, group] = args else {
            bail!("Usage: group <name> <group|none>");
        };
        let player = self.online(name)?;
        let group = (!group.eq_ignore_ascii_case("none")).then(|| group.to_string());
        self.world.set_group(player.id, group);
        Ok(())
    }

    fn operator(&self, args: &[&str]) -> Result<()> {
        let (name, on) = toggle_args(args, "op")?;
        let player = self.online(name)?;
        self.world.set_operator(player.id, on);
        Ok(())
    }

    fn vanish(&self, args: &[&str]) -> Result<()> {
        let (name, on) = toggle_args(args, "vanish")?;
        let player = self.online(name)?;
        self.world.set_invisible(player.id, on);
        Ok(())
    }

    fn run_as(&self, args: &[&str]) -> Result<()> {
        let [name, label, rest @ ..] = args else {
            bail!("Usage: as <name|console> <command...>");
        };
        let sender = self.sender(name)?;
        let label = label.trim_start_matches('/');
        if !self.plugin.dispatch(sender, label, rest) {
            bail!("Unknown command /{label}");
        }
        Ok(())
    }

    fn tab(&self, args: &[&str]) -> Result<()> {
        let [name, label, rest @ ..] = args else {
            bail!("Usage: tab <name|console> <command...>");
        };
        let sender = self.sender(name)?;
        // The argument being typed may be empty.
        let mut typed = rest.to_vec();
        if typed.is_empty() {
            typed.push("");
        }
        let suggestions = self
            .plugin
            .complete(sender, label.trim_start_matches('/'), &typed);
        self.say(format!("⇥ {}", suggestions.join(", ")));
        Ok(())
    }

    fn players(&self) {
        let players = self.world.online_players();
        if players.is_empty() {
            self.say("Nobody is online.");
        }
        for player in players {
            let p = player.location.position;
            self.say(format!(
                "👤 {} in {} at ({:.1}, {:.1}, {:.1}) yaw {:.0}",
                player.name, player.location.world, p.x, p.y, p.z, player.location.yaw
            ));
        }
    }

    async fn wait(&self, args: &[&str]) -> Result<()> {
        let [ms] = args else {
            bail!("Usage: wait <ms>");
        };
        let ms: u64 = ms.parse().with_context(|| format!("'{ms}' is not a duration"))?;
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(())
    }

    fn reload(&self) {
        match self.plugin.reload() {
            Ok(elapsed) => self.say(format!("🔄 Reloaded in {} ms", elapsed.as_millis())),
            Err(e) => self.say(format!("❌ Reload failed: {e}")),
        }
    }

    fn sender(&self, name: &str) -> Result<Sender> {
        if name.eq_ignore_ascii_case("console") {
            return Ok(Sender::Console);
        }
        Ok(Sender::Player(self.online(name)?.id))
    }
}

fn number(text: &str) -> Result<f64> {
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| anyhow!("'{text}' is not a number"))
}

fn toggle_args<'a>(args: &[&'a str], verb: &str) -> Result<(&'a str, bool)> {
    match args {
        [name] => Ok((*name, true)),
        [name, state] if state.eq_ignore_ascii_case("on") => Ok((*name, true)),
        [name, state] if state.eq_ignore_ascii_case("off") => Ok((*name, false)),
        _ => bail!("Usage: {verb} <name> [on|off]"),
    }
}
