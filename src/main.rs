use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use mume::audio::SilentEngine;
use mume::config::Config;
use mume::logging;
use mume::model::{Catalog, DownloadDir, HttpCatalog, HttpFetcher, JsonFileStore, RepeatMode, Track};
use mume::Player;

const HELP: &str = "\
commands:
  search <query>   search songs; results are numbered
  play <n>         play result n, queueing all results
  pause | resume   pause or resume playback
  next | prev      skip forward or back
  seek <seconds>   jump within the current track
  shuffle          toggle shuffle
  repeat           cycle repeat mode (none, all, one)
  fav <n>          toggle favorite for result n
  download <n>     download result n for offline playback
  rmdownload <n>   delete the download of result n
  queue            show the queue
  status           show what is playing
  theme            toggle light/dark theme
  quit             save and exit";

struct Shell {
    player: Player,
    catalog: Arc<HttpCatalog>,
    downloads: DownloadDir,
    fetcher: HttpFetcher,
    results: Vec<Track>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    let _log_guard = match logging::init_logging(&config.log_dir) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: Failed to initialize logging: {}", e);
            None
        }
    };

    tracing::info!(data_dir = %config.data_dir.display(), "=== mume starting ===");

    let store = Arc::new(JsonFileStore::new(config.data_dir.join("state")));
    let engine = Arc::new(SilentEngine::new(config.status_interval()));
    let player = Player::new(engine, store);
    player.load_persisted_state().await;

    let mut shell = Shell {
        player,
        catalog: Arc::new(HttpCatalog::new(config.api_base_url.clone())?),
        downloads: DownloadDir::new(&config.data_dir),
        fetcher: HttpFetcher::new(),
        results: Vec::new(),
    };

    println!("mume - type `help` for commands");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !shell.run(line).await {
            break;
        }
    }

    shell.player.persist_state().await;
    shell.player.shutdown().await;
    tracing::info!("mume shutting down");
    Ok(())
}

impl Shell {
    /// Execute one command line. Returns false when the shell should exit.
    async fn run(&mut self, line: &str) -> bool {
        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };
        tracing::debug!(command, arg, "Shell command");

        match command {
            "search" => self.search(arg).await,
            "play" => {
                if let Some(track) = self.pick(arg) {
                    let player = self.player.clone();
                    let catalog = self.catalog.clone();
                    let queue = self.results.clone();
                    tokio::spawn(async move {
                        player.resolve_and_play(&*catalog, track, Some(queue)).await;
                    });
                }
            }
            "pause" => self.player.pause().await,
            "resume" => self.player.resume().await,
            "next" => {
                tokio::spawn(self.player.next(false));
            }
            "prev" => {
                tokio::spawn(self.player.previous());
            }
            "seek" => match arg.parse::<u32>() {
                Ok(seconds) => self.player.seek_to(seconds).await,
                Err(_) => println!("usage: seek <seconds>"),
            },
            "shuffle" => {
                let on = self.player.toggle_shuffle();
                println!("shuffle {}", if on { "on" } else { "off" });
            }
            "repeat" => {
                let mode = self.player.toggle_repeat();
                println!("repeat {}", repeat_label(mode));
            }
            "fav" => {
                if let Some(track) = self.pick(arg) {
                    let favorite = self.player.toggle_favorite(&track);
                    self.player.persist_state().await;
                    println!("{} {}", if favorite { "♥" } else { "♡" }, track.title);
                }
            }
            "download" => {
                if let Some(track) = self.pick(arg) {
                    let track = mume::model::resolve_track(&*self.catalog, track).await;
                    if self
                        .player
                        .download_track(&track, &self.downloads, &self.fetcher)
                        .await
                    {
                        println!("downloaded {}", track.title);
                    } else {
                        println!("download failed for {}", track.title);
                    }
                }
            }
            "rmdownload" => {
                if let Some(track) = self.pick(arg) {
                    if self.player.remove_download(&track.id).await {
                        println!("removed download of {}", track.title);
                    } else {
                        println!("{} is not downloaded", track.title);
                    }
                }
            }
            "queue" => self.print_queue(),
            "status" => self.print_status(),
            "theme" => {
                let theme = self.player.toggle_theme().await;
                println!("theme {}", theme.as_str());
            }
            "help" => println!("{HELP}"),
            "quit" | "exit" => return false,
            other => println!("unknown command `{other}`, try `help`"),
        }
        true
    }

    async fn search(&mut self, query: &str) {
        if query.is_empty() {
            println!("usage: search <query>");
            return;
        }
        self.results = self
            .catalog
            .search_songs(query, 1, mume::model::DEFAULT_PAGE_SIZE)
            .await;
        if self.results.is_empty() {
            println!("no results");
            return;
        }
        for (idx, track) in self.results.iter().enumerate() {
            let mut marks = String::new();
            if self.player.is_favorite(&track.id) {
                marks.push_str(" ♥");
            }
            if self.player.is_downloaded(&track.id) {
                marks.push_str(" ⤓");
            }
            println!(
                "{:>2}. {} - {} ({}){}",
                idx + 1,
                track.title,
                track.artist,
                format_time(track.duration_secs),
                marks
            );
        }
    }

    /// Result number `arg` (1-based)
    fn pick(&self, arg: &str) -> Option<Track> {
        let picked = arg
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| self.results.get(idx).cloned());
        if picked.is_none() {
            println!("pick a result between 1 and {}", self.results.len());
        }
        picked
    }

    fn print_queue(&self) {
        let state = self.player.state();
        if state.queue.is_empty() {
            println!("queue is empty");
            return;
        }
        for (idx, track) in state.queue.tracks().iter().enumerate() {
            let marker = if state.current_index() == Some(idx) { ">" } else { " " };
            println!("{marker}{:>2}. {} - {}", idx + 1, track.title, track.artist);
        }
    }

    fn print_status(&self) {
        let state = self.player.state();
        let Some(track) = &state.current_track else {
            println!("nothing playing");
            return;
        };
        let status = if state.is_loading {
            "loading"
        } else if state.is_playing {
            "playing"
        } else {
            "paused"
        };
        println!(
            "[{status}] {} - {}  {} / {}  shuffle {}  repeat {}",
            track.title,
            track.artist,
            format_time(state.position_secs),
            format_time(state.duration_secs),
            if state.shuffle { "on" } else { "off" },
            repeat_label(state.repeat),
        );
    }
}

fn repeat_label(mode: RepeatMode) -> &'static str {
    match mode {
        RepeatMode::None => "none",
        RepeatMode::All => "all",
        RepeatMode::One => "one",
    }
}

fn format_time(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
