//! Async driver for a [`Kiosk`].
//!
//! The kiosk itself never sleeps. [`KioskRuntime`] owns it inside a single
//! tokio task and waits on two things at once: the next command from a
//! [`KioskHandle`], and the kiosk's own next deadline. Whichever comes first
//! is handled to completion before waiting again, so no lock is needed.
//!
//! Build the kiosk with a [`TokioClock`] so that its deadlines and tokio's
//! timers agree, including under `tokio::time::pause`.
//!
//! # Examples
//!
//! ```no_run
//! use kiosk_emulator::{Kiosk, KioskRuntime, TokioClock};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let kiosk = Kiosk::builder().with_clock(TokioClock).build()?;
//! let (handle, task) = KioskRuntime::spawn(kiosk);
//!
//! handle.insert_coin(100).await?;
//! handle.insert_coin(20).await?;
//! println!("{:?}", handle.snapshot().await?.state);
//!
//! handle.shutdown().await?;
//! let _kiosk = task.await?;
//! # Ok(())
//! # }
//! ```

use std::time::Instant;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use kiosk_core::Clock;

use crate::controller::{Kiosk, KioskSnapshot};
use crate::maintenance::JournalEntry;

/// Capacity of the command channel.
const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Clock backed by tokio's time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

/// Errors reported to a [`KioskHandle`].
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The runtime task has stopped.
    #[error("Kiosk runtime is not running")]
    Closed,
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// One inbound operation.
#[derive(Debug)]
pub enum KioskCommand {
    InsertCoin(u32),
    StartCardPayment,
    SubmitCardNumber(String),
    VerifyQr(String),
    VerifyCard(String),
    MaintenanceCode(String),
    PersonPassed,
    OpenDrawer,
    CloseDrawer,
    ConfirmZero(bool),
    Reset,
    /// Reply with the current [`KioskSnapshot`].
    Snapshot(oneshot::Sender<KioskSnapshot>),
    /// Reply with the maintenance journal.
    Journal(oneshot::Sender<Vec<JournalEntry>>),
    /// Stop the runtime and hand the kiosk back through the task's result.
    Shutdown,
}

#[derive(Debug)]
struct Envelope {
    command: KioskCommand,
    reply: Option<oneshot::Sender<bool>>,
}

/// Task owning a kiosk.
pub struct KioskRuntime {
    kiosk: Kiosk,
    commands: mpsc::Receiver<Envelope>,
}

impl KioskRuntime {
    /// Spawn a runtime task for `kiosk` on the current tokio runtime.
    ///
    /// # Returns
    ///
    /// Returns a handle for sending commands and the task, which resolves
    /// to the kiosk once the runtime stops.
    pub fn spawn(kiosk: Kiosk) -> (KioskHandle, JoinHandle<Kiosk>) {
        let (tx, commands) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let runtime = KioskRuntime { kiosk, commands };
        let task = tokio::spawn(runtime.run());
        (KioskHandle { tx }, task)
    }

    /// Run until a `Shutdown` command arrives or every handle is dropped.
    pub async fn run(mut self) -> Kiosk {
        info!(state = %self.kiosk.state(), "Kiosk runtime started");

        loop {
            let deadline = self.kiosk.next_deadline();

            tokio::select! {
                envelope = self.commands.recv() => match envelope {
                    Some(Envelope { command: KioskCommand::Shutdown, reply }) => {
                        if let Some(reply) = reply {
                            let _ = reply.send(true);
                        }
                        break;
                    }
                    Some(envelope) => self.handle(envelope),
                    None => {
                        debug!("All kiosk handles dropped");
                        break;
                    }
                },
                () = sleep_until(deadline) => {
                    let fired = self.kiosk.poll();
                    trace!(fired, state = %self.kiosk.state(), "Timers fired");
                }
            }
        }

        info!(state = %self.kiosk.state(), "Kiosk runtime stopped");
        self.kiosk
    }

    fn handle(&mut self, envelope: Envelope) {
        let Envelope { command, reply } = envelope;
        debug!(command = ?command, "Kiosk command");

        let kiosk = &mut self.kiosk;
        let accepted = match command {
            KioskCommand::InsertCoin(cents) => kiosk.insert_coin(cents),
            KioskCommand::StartCardPayment => kiosk.start_card_payment(),
            KioskCommand::SubmitCardNumber(number) => kiosk.submit_card_number(&number),
            KioskCommand::VerifyQr(code) => kiosk.verify_qr(&code),
            KioskCommand::VerifyCard(code) => kiosk.verify_card(&code),
            KioskCommand::MaintenanceCode(code) => kiosk.submit_maintenance_code(&code),
            KioskCommand::PersonPassed => kiosk.on_person_passed(),
            KioskCommand::OpenDrawer => kiosk.open_drawer(),
            KioskCommand::CloseDrawer => kiosk.close_drawer(),
            KioskCommand::ConfirmZero(zero) => kiosk.confirm_zero(zero),
            KioskCommand::Reset => {
                kiosk.reset();
                true
            }
            KioskCommand::Snapshot(tx) => {
                let _ = tx.send(kiosk.snapshot());
                true
            }
            KioskCommand::Journal(tx) => {
                let _ = tx.send(kiosk.maintenance().journal().iter().cloned().collect());
                true
            }
            KioskCommand::Shutdown => true,
        };

        if let Some(reply) = reply {
            // The caller may have given up waiting
            let _ = reply.send(accepted);
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

/// Cloneable sender of commands to a [`KioskRuntime`].
#[derive(Debug, Clone)]
pub struct KioskHandle {
    tx: mpsc::Sender<Envelope>,
}

impl KioskHandle {
    /// Send a command and wait for the kiosk's answer.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::Closed` if the runtime has stopped.
    pub async fn send(&self, command: KioskCommand) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Envelope {
                command,
                reply: Some(reply),
            })
            .await
            .map_err(|_| RuntimeError::Closed)?;
        rx.await.map_err(|_| RuntimeError::Closed)
    }

    pub async fn insert_coin(&self, cents: u32) -> Result<bool> {
        self.send(KioskCommand::InsertCoin(cents)).await
    }

    pub async fn start_card_payment(&self) -> Result<bool> {
        self.send(KioskCommand::StartCardPayment).await
    }

    pub async fn submit_card_number(&self, number: impl Into<String>) -> Result<bool> {
        self.send(KioskCommand::SubmitCardNumber(number.into())).await
    }

    pub async fn verify_qr(&self, code: impl Into<String>) -> Result<bool> {
        self.send(KioskCommand::VerifyQr(code.into())).await
    }

    pub async fn verify_card(&self, code: impl Into<String>) -> Result<bool> {
        self.send(KioskCommand::VerifyCard(code.into())).await
    }

    pub async fn submit_maintenance_code(&self, code: impl Into<String>) -> Result<bool> {
        self.send(KioskCommand::MaintenanceCode(code.into())).await
    }

    pub async fn person_passed(&self) -> Result<bool> {
        self.send(KioskCommand::PersonPassed).await
    }

    pub async fn open_drawer(&self) -> Result<bool> {
        self.send(KioskCommand::OpenDrawer).await
    }

    pub async fn close_drawer(&self) -> Result<bool> {
        self.send(KioskCommand::CloseDrawer).await
    }

    pub async fn confirm_zero(&self, zero: bool) -> Result<bool> {
        self.send(KioskCommand::ConfirmZero(zero)).await
    }

    pub async fn reset(&self) -> Result<()> {
        self.send(KioskCommand::Reset).await.map(|_| ())
    }

    /// Current kiosk snapshot.
    pub async fn snapshot(&self) -> Result<KioskSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(KioskCommand::Snapshot(tx)).await?;
        rx.await.map_err(|_| RuntimeError::Closed)
    }

    /// Maintenance journal, oldest first.
    pub async fn journal(&self) -> Result<Vec<JournalEntry>> {
        let (tx, rx) = oneshot::channel();
        self.send(KioskCommand::Journal(tx)).await?;
        rx.await.map_err(|_| RuntimeError::Closed)
    }

    /// Stop the runtime.
    pub async fn shutdown(&self) -> Result<()> {
        self.send(KioskCommand::Shutdown).await.map(|_| ())
    }
}
