use std::time::Duration;

use anyhow::{anyhow, Result};
use common::error::FancyError;
use frame::Frame;
use simplelog::{debug, info, warn};
use subject::Subject;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{tcp::OwnedWriteHalf, TcpStream},
    select, spawn,
    sync::{
        mpsc::{self, Receiver, Sender},
        watch,
    },
    task::JoinHandle,
    time::sleep,
};

use crate::task::{Task, TaskSender};

pub mod frame;
pub mod payload;
pub mod subject;

const OUTGOING_BUFFER: usize = 128;
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// A message received from the bus.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub subject: Subject,
    pub payload: String,
}

/// Keeps a TCP connection to the message bus alive in the background.
///
/// Every (re)connect subscribes to the given subjects and reports
/// [`Task::Connected`]; incoming publish frames are forwarded as
/// [`Task::Message`], a lost connection as [`Task::Disconnected`].
pub struct BusConnection {
    outgoing: Sender<Frame>,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

enum Closed {
    Shutdown,
    Remote,
}

impl BusConnection {
    pub fn start(address: String, subscriptions: Vec<Subject>, queue: TaskSender) -> Self {
        info!("Starting bus connection to {}...", address);

        let (outgoing, receiver) = mpsc::channel(OUTGOING_BUFFER);
        let (sender, shutdown) = watch::channel(false);

        let handle = spawn(async move {
            if let Err(error) = run(address, subscriptions, queue, receiver, shutdown).await {
                FancyError::print_fancy(&error, false);
            }
        });

        Self {
            outgoing,
            shutdown: sender,
            handle,
        }
    }

    pub fn publish(&self, frame: Frame) -> Result<()> {
        self.outgoing
            .try_send(frame)
            .map_err(|error| anyhow!("Failed to queue message for the bus: {}", error))
    }

    /// Writes out everything published so far, then closes the connection.
    pub async fn shutdown(self) -> Result<()> {
        // The task may already be gone if it failed
        self.shutdown.send(true).ok();
        self.handle.await?;
        Ok(())
    }
}

async fn run(
    address: String,
    subscriptions: Vec<Subject>,
    queue: TaskSender,
    mut outgoing: Receiver<Frame>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    loop {
        let stream = select! {
            _ = shutdown.changed() => return Ok(()),
            stream = TcpStream::connect(&address) => stream,
        };

        match stream {
            Ok(stream) => {
                info!("Connected to message bus at {}", address);
                let closed =
                    session(stream, &subscriptions, &queue, &mut outgoing, &mut shutdown).await;
                match closed {
                    Ok(Closed::Shutdown) => return Ok(()),
                    Ok(Closed::Remote) => {
                        warn!("Message bus closed the connection. Reconnect in 1 second")
                    }
                    Err(error) => warn!(
                        "Lost connection to the message bus: {}. Reconnect in 1 second",
                        error
                    ),
                }
                queue.submit(Task::Disconnected).await?;
            }
            Err(error) => warn!(
                "Could not connect to the message bus at {}: {}. Reconnect in 1 second",
                address,
                error
            ),
        }

        select! {
            _ = shutdown.changed() => return Ok(()),
            _ = sleep(RECONNECT_DELAY) => {}
        }
    }
}

async fn session(
    stream: TcpStream,
    subscriptions: &[Subject],
    queue: &TaskSender,
    outgoing: &mut Receiver<Frame>,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<Closed> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    for subject in subscriptions {
        debug!("Subscribing to {}", subject);
        let frame = Frame::Subscribe {
            subject: subject.clone(),
        };
        write(&mut writer, &frame).await?;
    }

    // Frames queued while the connection was down are stale
    while outgoing.try_recv().is_ok() {}
    queue.submit(Task::Connected).await?;

    loop {
        select! {
            biased;
            _ = shutdown.changed() => {
                while let Ok(frame) = outgoing.try_recv() {
                    write(&mut writer, &frame).await?;
                }
                writer.shutdown().await.ok();
                return Ok(Closed::Shutdown);
            }
            frame = outgoing.recv() => match frame {
                Some(frame) => write(&mut writer, &frame).await?,
                None => return Ok(Closed::Shutdown),
            },
            line = lines.next_line() => match line? {
                Some(line) => forward(&line, queue).await?,
                None => return Ok(Closed::Remote),
            },
        }
    }
}

async fn write(writer: &mut OwnedWriteHalf, frame: &Frame) -> Result<()> {
    writer.write_all(frame.encode()?.as_bytes()).await?;
    Ok(())
}

async fn forward(line: &str, queue: &TaskSender) -> Result<()> {
    if line.trim().is_empty() {
        return Ok(());
    }
    match Frame::decode(line) {
        Ok(Frame::Publish {
            subject, payload, ..
        }) => {
            queue
                .submit(Task::Message(Message { subject, payload }))
                .await
        }
        Ok(Frame::Subscribe { subject }) => {
            debug!("Ignoring subscribe frame for {} from the bus", subject);
            Ok(())
        }
        Err(error) => {
            warn!("Received malformed frame from the bus: {}", error);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::{net::TcpListener, time::timeout};

    use super::*;
    use crate::task::TaskManager;

    const WAIT: Duration = Duration::from_secs(5);

    async fn next_task(tasks: &mut TaskManager) -> Task {
        timeout(WAIT, tasks.recv()).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_subscribe_forward_publish_and_reconnect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let mut tasks = TaskManager::init();
        tasks.set_ready(true);
        let bus = BusConnection::start(
            address,
            vec![
                Subject::new(subject::CONFIG),
                Subject::new(subject::POSTMARK_REQUEST),
            ],
            tasks.get_sender(),
        );

        let (socket, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        let (reader, mut writer) = socket.into_split();
        let mut lines = BufReader::new(reader).lines();

        for expected in [subject::CONFIG, subject::POSTMARK_REQUEST] {
            let line = lines.next_line().await.unwrap().unwrap();
            assert_eq!(
                Frame::decode(&line).unwrap(),
                Frame::Subscribe {
                    subject: Subject::new(expected)
                }
            );
        }
        assert!(matches!(next_task(&mut tasks).await, Task::Connected));

        let incoming = Frame::publish(&["Gateway", "Postmark", "Request"], "{}".to_string(), 0);
        writer
            .write_all(incoming.encode().unwrap().as_bytes())
            .await
            .unwrap();
        writer.write_all(b"not json\n").await.unwrap();
        match next_task(&mut tasks).await {
            Task::Message(message) => {
                assert_eq!(
                    message.subject,
                    Subject::new(&["Gateway", "Postmark", "Request"])
                );
                assert_eq!(message.payload, "{}");
            }
            _ => panic!("expected a message"),
        }

        let outgoing = Frame::publish(subject::HERE, String::new(), 0);
        bus.publish(outgoing.clone()).unwrap();
        let line = lines.next_line().await.unwrap().unwrap();
        assert_eq!(Frame::decode(&line).unwrap(), outgoing);

        drop(writer);
        drop(lines);
        assert!(matches!(next_task(&mut tasks).await, Task::Disconnected));

        let (socket, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        let mut lines = BufReader::new(socket).lines();
        let line = lines.next_line().await.unwrap().unwrap();
        assert!(matches!(Frame::decode(&line).unwrap(), Frame::Subscribe { .. }));
        lines.next_line().await.unwrap().unwrap();
        assert!(matches!(next_task(&mut tasks).await, Task::Connected));

        let dead = Frame::publish(subject::DEAD, String::new(), -43200);
        bus.publish(dead.clone()).unwrap();
        timeout(WAIT, bus.shutdown()).await.unwrap().unwrap();

        let line = lines.next_line().await.unwrap().unwrap();
        assert_eq!(Frame::decode(&line).unwrap(), dead);
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_shutdown_while_unreachable() {
        // Bind and drop to get a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        let tasks = TaskManager::init();
        tasks.set_ready(true);
        let bus = BusConnection::start(address, Vec::new(), tasks.get_sender());
        timeout(WAIT, bus.shutdown()).await.unwrap().unwrap();
    }
}
