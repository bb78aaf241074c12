#[macro_use]
extern crate tracing;

mod framebuffer;
mod pixelflut;

use anyhow::bail;
use framebuffer::{Framebuffer, Output};
use pixelflut::Pixelflut;
use scrawl_common::{FrameEnd, Interpreter, Surface, Tool};
use std::{
    fs::File,
    io::{self, BufRead},
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    sync::mpsc::{self, Receiver},
    thread,
    time::Duration,
};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

const WHERE_TO: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 1337);

const ESCAPE: char = '\u{1b}';

#[derive(Clone, argh::FromArgs)]
/// Frame-stepped sketch viewer drawing onto a pixelflut server :P
///
/// type `q` or ESC followed by enter to stop
struct Args {
    #[argh(positional)]
    /// sketch program to play
    program: PathBuf,

    #[argh(option, default = "10.0")]
    /// frames drawn per second
    framerate: f32,

    #[argh(option, default = "WHERE_TO")]
    /// address of the pixelflut server
    addr: SocketAddr,

    #[argh(option, default = "200")]
    /// width of the viewing area
    width: usize,

    #[argh(option, default = "200")]
    /// height of the viewing area
    height: usize,

    #[argh(option, default = "0")]
    /// x offset
    x_offset: usize,

    #[argh(option, default = "0")]
    /// y offset
    y_offset: usize,

    #[argh(switch)]
    /// send the pixels of each frame in random order
    shuffle: bool,
}

/// Forward every character typed on stdin. Line buffering means keys
/// arrive once enter is pressed.
fn spawn_key_listener() -> Receiver<char> {
    let (sender, keys) = mpsc::channel();

    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };

            for key in line.chars() {
                if sender.send(key).is_err() {
                    return;
                }
            }
        }
    });

    keys
}

fn is_quit_key(key: char) -> bool {
    key == 'q' || key == ESCAPE
}

/// Plays a program one frame per tick, resuming where the last tick ended.
struct Viewer {
    program: PathBuf,
    interpreter: Interpreter,
    frame_ctr: usize,
}

impl Viewer {
    fn new(program: PathBuf) -> Self {
        Self {
            program,
            interpreter: Interpreter::with_initial_tool(Tool::Line),
            frame_ctr: 0,
        }
    }

    /// Re-open the program, run the next frame onto `framebuffer` and show it.
    fn tick(&mut self, framebuffer: &mut Framebuffer) -> anyhow::Result<()> {
        let program = match File::open(&self.program)
            .and_then(|file| unsafe { memmap2::Mmap::map(&file) })
        {
            Ok(program) => program,
            Err(error) => {
                warn!(
                    ?error,
                    path = %self.program.display(),
                    "cannot map program, retrying next frame"
                );
                return Ok(());
            }
        };

        let frame = self.interpreter.run_frame(&program, framebuffer);
        debug!(
            start = frame.start,
            end = frame.end,
            outcome = ?frame.outcome,
            "ran frame"
        );

        framebuffer.show();
        self.interpreter.reset_transient();

        self.frame_ctr = match frame.outcome {
            FrameEnd::NextFrame => self.frame_ctr + 1,
            FrameEnd::EndOfProgram => 0,
        };
        info!("switching to frame {}", self.frame_ctr);

        Ok(())
    }
}

async fn run(args: Args, keys: Receiver<char>) -> anyhow::Result<()> {
    let offset = (args.x_offset, args.y_offset);
    let mut conn = Pixelflut::connect(args.addr, offset, args.shuffle).await?;
    let mut framebuffer = Framebuffer::new(args.width, args.height);
    let mut viewer = Viewer::new(args.program);
    let sleep_duration = Duration::from_secs_f32(1.0 / args.framerate);

    info!("starting playback >:3");

    loop {
        if keys.try_iter().any(is_quit_key) {
            info!("quit requested");
            break;
        }

        viewer.tick(&mut framebuffer)?;

        for output in framebuffer.take_output() {
            match output {
                Output::Show(pixels) => {
                    if let Err(error) = conn.send(pixels).await {
                        error!(?error, "sending failed :((");
                        framebuffer.invalidate();
                        conn.reconnect().await?;
                    }
                }
                Output::Pause(duration) => monoio::time::sleep(duration).await,
            }
        }

        monoio::time::sleep(sleep_duration).await;
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args: Args = argh::from_env();

    if !(args.framerate.is_finite() && args.framerate > 0.0) {
        bail!("framerate must be a positive number, got {}", args.framerate);
    }

    let keys = spawn_key_listener();

    let mut runtime =
        monoio::RuntimeBuilder::<monoio::time::TimeDriver<monoio::IoUringDriver>>::new().build()?;

    runtime.block_on(run(args, keys))
}
