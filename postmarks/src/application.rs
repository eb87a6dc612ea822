use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::Result;
use common::error::FancyError;
use postmark::PostmarkManager;
use simplelog::{debug, info, warn};
use store::{PostmarkStore, TomlStore};
use tokio::{
    pin, select,
    time::{interval, Instant},
};

use crate::{
    build_info::VERSION,
    config::Config,
    network::{
        frame::{Frame, RETAINED_TTL},
        subject::{self, Subject},
        BusConnection, Message,
    },
    task::{Task, TaskManager},
};

pub mod dispatcher;
pub mod postmark;
pub mod store;

const TICK_RATE: u64 = 10;
const HERE_INTERVAL: Duration = Duration::from_secs(2);
const CONFIG_REQUEST_INTERVAL: Duration = Duration::from_secs(3);

pub struct Controller {
    /* State */
    running: Arc<AtomicBool>,
    connected: bool,
    last_here: Instant,
    last_config_request: Instant,

    /* Tasks */
    tasks: TaskManager,

    /* Components */
    postmarks: PostmarkManager<TomlStore>,
    bus: Option<BusConnection>,

    /* Config */
    config: Config,
}

impl Controller {
    pub fn init(config: Config) -> Result<Self> {
        let store = TomlStore::open(config.database())?;
        let mut postmarks = PostmarkManager::init(store);
        debug!(
            "{} devices hold a postmark",
            postmarks.store().records()?.len()
        );

        if config.ranges().is_empty() {
            info!("No buckets configured, waiting for the configuration from the bus");
        } else {
            info!("Loading {} buckets from the configuration file...", config.ranges().len());
            let dropped = postmarks.reload(config.ranges())?;
            if !dropped.is_empty() {
                warn!("Dropped {} stored postmarks that no longer fit", dropped.len());
            }
        }

        let now = Instant::now();
        Ok(Self {
            running: Arc::new(AtomicBool::new(true)),
            connected: false,
            last_here: now,
            last_config_request: now,
            tasks: TaskManager::init(),
            postmarks,
            bus: None,
            config,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup signal handlers
        self.setup_handlers()?;

        // Start the bus connection
        self.tasks.set_ready(true);
        self.bus = Some(BusConnection::start(
            self.config.bus().address().clone(),
            vec![
                Subject::new(subject::CONFIG),
                Subject::new(subject::POSTMARK_REQUEST),
            ],
            self.tasks.get_sender(),
        ));

        // Main loop
        let mut interval = interval(Duration::from_millis(1000 / TICK_RATE));
        while self.running.load(Ordering::Relaxed) {
            select! {
                _ = interval.tick() => self.tick(),
                task = self.tasks.recv() => if let Some(task) = task {
                    self.handle(task);
                }
            }
        }

        // Shutdown
        self.shutdown().await?;

        Ok(())
    }

    fn tick(&mut self) {
        if !self.connected {
            return;
        }

        let now = Instant::now();
        if now.duration_since(self.last_here) >= HERE_INTERVAL {
            self.last_here = now;
            self.publish(Frame::publish(subject::HERE, String::new(), 0));
        }
        if !self.postmarks.is_configured()
            && now.duration_since(self.last_config_request) >= CONFIG_REQUEST_INTERVAL
        {
            self.request_config(now);
        }
    }

    fn handle(&mut self, task: Task) {
        match task {
            Task::Connected => {
                self.connected = true;
                self.publish(Frame::publish(
                    subject::ALIVE,
                    VERSION.to_string(),
                    RETAINED_TTL,
                ));

                let now = Instant::now();
                self.last_here = now;
                if !self.postmarks.is_configured() {
                    self.request_config(now);
                }
            }
            Task::Disconnected => self.connected = false,
            Task::Message(message) => self.handle_message(message),
        }
    }

    fn handle_message(&mut self, message: Message) {
        match dispatcher::dispatch(&mut self.postmarks, &message) {
            Ok(frames) => frames.into_iter().for_each(|frame| self.publish(frame)),
            Err(error) => FancyError::print_fancy(&error, false),
        }
    }

    fn request_config(&mut self, now: Instant) {
        self.last_config_request = now;
        info!("Requesting configuration from the bus...");
        self.publish(Frame::publish(
            subject::CONFIG_REQUEST,
            VERSION.to_string(),
            0,
        ));
    }

    fn publish(&self, frame: Frame) {
        if !self.connected {
            debug!("Not connected to the bus, dropping {:?}", frame);
            return;
        }
        if let Some(bus) = &self.bus {
            if let Err(error) = bus.publish(frame) {
                warn!("{}", error);
            }
        }
    }

    async fn shutdown(&mut self) -> Result<()> {
        info!("Starting shutdown sequence...");

        // Say goodbye and close the bus connection
        self.publish(Frame::publish(subject::DEAD, String::new(), RETAINED_TTL));
        if let Some(bus) = self.bus.take() {
            let closed = bus.shutdown();
            pin!(closed);
            // Drain the queue while the connection task flushes
            loop {
                select! {
                    result = &mut closed => break result?,
                    _ = self.tasks.recv() => {}
                }
            }
        }
        self.tasks.set_ready(false);

        info!("Shutdown complete. Bye :)");
        Ok(())
    }

    fn setup_handlers(&self) -> Result<()> {
        let flag = self.running.clone();
        ctrlc::set_handler(move || {
            info!("Received SIGINT, shutting down...");
            flag.store(false, Ordering::Relaxed);
        })
        .map_err(|error| error.into())
    }
}
