use clap::Parser;
use client::config::{resolve_room, ClientConfig};
use client::error::ClientError;
use client::game::{GameStore, Viewport};
use client::network::Connection;
use client::render_loop::RenderLoop;
use log::{error, info};
use macroquad::window::Conf;
use macroquad::Window;
use shared::DEFAULT_RECONNECT_DELAY_MS;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Game server endpoint (ws:// or wss://)
    #[arg(short = 's', long, env = "ARENA_WS_URL")]
    server: Option<String>,

    /// Room code to join; a new one is generated when omitted
    #[arg(short = 'r', long)]
    room: Option<String>,

    /// Display name shown to other players
    #[arg(short = 'n', long)]
    name: String,

    /// Window width
    #[arg(short = 'w', long, default_value = "800")]
    width: u32,

    /// Window height (no short flag to avoid conflict with --help)
    #[arg(long, default_value = "600")]
    height: u32,

    /// Delay before reconnecting after an abnormal close, in milliseconds
    #[arg(long, default_value_t = DEFAULT_RECONNECT_DELAY_MS)]
    reconnect_ms: u64,
}

fn build_config(args: &Args) -> Result<ClientConfig, ClientError> {
    let room = resolve_room(args.room.as_deref())?;
    let config = ClientConfig::new(args.server.clone(), room, &args.name)?
        .with_reconnect_delay(Duration::from_millis(args.reconnect_ms));
    Ok(config)
}

fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let store = Arc::new(GameStore::with_viewport(Viewport::new(args.width, args.height)));

    let conf = Conf {
        window_title: "Arena Dash".to_string(),
        window_width: args.width as i32,
        window_height: args.height as i32,
        window_resizable: true,
        ..Default::default()
    };

    let render_loop = match build_config(&args) {
        Ok(config) => {
            info!("Joining room {} as {}", config.room_id, config.name);
            info!("Controls: arrows or WASD to move, Enter to dismiss errors, Esc to leave");

            let room_label = config.room_id.to_string();
            let (connection, handle) = Connection::new(config, Arc::clone(&store));
            match connection.spawn() {
                Ok(thread) => {
                    RenderLoop::new(Arc::clone(&store), room_label).with_connection(handle, thread)
                }
                Err(e) => {
                    error!("Failed to start connection thread: {}", e);
                    store.set_error(ClientError::Transport(e.to_string()).to_string());
                    RenderLoop::new(Arc::clone(&store), room_label)
                }
            }
        }
        Err(e) => {
            error!("{}", e);
            store.set_error(e.to_string());
            RenderLoop::new(Arc::clone(&store), "-----")
        }
    };

    Window::from_config(conf, render_loop.run());
}
