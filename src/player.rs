//! Automated player: decides when to think and plays the engine's answer.
//!
//! The player subscribes to the board's turn-change, reset and end events.
//! Those callbacks only forward a [`Command`] into a channel; a single task
//! drains the channel in emission order, so the board is never touched from
//! inside its own notification.
//!
//! A turn change to this player's colour schedules a think after the
//! response delay. A turn change to the other colour, or the end of the
//! game, cancels a think that has not started yet. A think that has started
//! runs to completion, but its result is only played if the board is still
//! in the position the engine was given.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::board::{Board, GameResult, Piece, Snapshot};
use crate::config::PlayerConfig;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::events::{BoardEvent, SubscriptionId, Topic};
use crate::move_finder;
use crate::moves::Move;

/// The live board, shared between the player task and its collaborators.
pub type SharedBoard = Arc<Mutex<Board>>;

pub fn shared(board: Board) -> SharedBoard {
    Arc::new(Mutex::new(board))
}

/// Lock the shared board. Board primitives never panic halfway through a
/// mutation, so a poisoned lock still guards a consistent board.
pub fn lock_board(board: &SharedBoard) -> MutexGuard<'_, Board> {
    board.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Lifecycle notifications from the player.
#[derive(Debug)]
pub enum PlayerSignal {
    ThinkStart,
    ThinkEnd,
    Played { x: usize, y: usize },
    Passed,
    GameOver(Option<GameResult>),
    /// The think failed; the board was left alone.
    Failed(EngineError),
}

#[derive(Debug)]
enum Command {
    TurnChange { ended: bool },
    End,
    /// A scheduled think firing. Ignored unless it carries the current generation.
    Think(u64),
    Sleep,
    Wakeup,
    Shutdown,
}

/// Control handle for a spawned [`AutomatedPlayer`].
#[derive(Debug)]
pub struct PlayerHandle {
    piece: Piece,
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl PlayerHandle {
    pub fn piece(&self) -> Piece {
        self.piece
    }

    /// Stop reacting to turn changes until [`PlayerHandle::wakeup`].
    pub fn sleep(&self) {
        let _ = self.commands.send(Command::Sleep);
    }

    /// Resume, thinking right away if it is already this player's turn.
    pub fn wakeup(&self) {
        let _ = self.commands.send(Command::Wakeup);
    }

    /// Stop the player task and detach it from the board.
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Err(err) = self.task.await {
            warn!(player = %self.piece, error = %err, "player task did not stop cleanly");
        }
    }
}

pub struct AutomatedPlayer<E> {
    board: SharedBoard,
    piece: Piece,
    engine: E,
    config: PlayerConfig,
    sleeping: bool,
    pending: Option<JoinHandle<()>>,
    generation: u64,
    commands: mpsc::UnboundedSender<Command>,
    signals: mpsc::UnboundedSender<PlayerSignal>,
    subscriptions: Vec<SubscriptionId>,
}

impl<E: Engine> AutomatedPlayer<E> {
    /// Attach a player for `piece` to the board and start its task.
    ///
    /// Must be called from within a tokio runtime. The player starts awake
    /// but does not move until the next turn change or [`PlayerHandle::wakeup`].
    pub fn spawn(
        board: SharedBoard,
        piece: Piece,
        engine: E,
        config: PlayerConfig,
    ) -> (PlayerHandle, mpsc::UnboundedReceiver<PlayerSignal>) {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (signals, signal_rx) = mpsc::unbounded_channel();

        let subscriptions = {
            let mut live = lock_board(&board);
            let tx = commands.clone();
            let on_turn = live.subscribe(Topic::TurnChange, move |event| {
                if let BoardEvent::TurnChange { ended } = *event {
                    let _ = tx.send(Command::TurnChange { ended });
                }
            });
            let tx = commands.clone();
            let on_reset = live.subscribe(Topic::Reset, move |_| {
                let _ = tx.send(Command::TurnChange { ended: false });
            });
            let tx = commands.clone();
            let on_end = live.subscribe(Topic::End, move |_| {
                let _ = tx.send(Command::End);
            });
            vec![on_turn, on_reset, on_end]
        };

        let player = AutomatedPlayer {
            board,
            piece,
            engine,
            config,
            sleeping: false,
            pending: None,
            generation: 0,
            commands: commands.clone(),
            signals,
            subscriptions,
        };
        let task = tokio::spawn(player.run(command_rx));

        (
            PlayerHandle {
                piece,
                commands,
                task,
            },
            signal_rx,
        )
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = commands.recv().await {
            match command {
                Command::TurnChange { ended } => {
                    if ended || self.sleeping {
                        continue;
                    }
                    if self.is_my_turn() {
                        self.schedule_think();
                    } else {
                        debug!(player = %self.piece, "your turn");
                        self.cancel_pending();
                    }
                }
                Command::End => {
                    self.cancel_pending();
                    if !self.sleeping {
                        info!(player = %self.piece, "good game :)");
                        let result = lock_board(&self.board).result();
                        self.emit(PlayerSignal::GameOver(result));
                    }
                }
                Command::Think(generation) => {
                    if generation != self.generation {
                        debug!(player = %self.piece, "stale think dropped");
                        continue;
                    }
                    self.pending = None;
                    if !self.sleeping {
                        self.think().await;
                    }
                }
                Command::Sleep => {
                    self.sleeping = true;
                    self.cancel_pending();
                }
                Command::Wakeup => {
                    self.sleeping = false;
                    if self.is_my_turn() {
                        self.cancel_pending();
                        self.think().await;
                    }
                }
                Command::Shutdown => break,
            }
        }

        self.cancel_pending();
        let mut live = lock_board(&self.board);
        for id in self.subscriptions.drain(..) {
            live.unsubscribe(id);
        }
    }

    fn name(&self) -> String {
        format!("Bot({})", self.piece)
    }

    fn is_my_turn(&self) -> bool {
        let live = lock_board(&self.board);
        !live.is_terminal() && live.next_piece() == self.piece
    }

    fn emit(&self, signal: PlayerSignal) {
        let _ = self.signals.send(signal);
    }

    fn schedule_think(&mut self) {
        self.cancel_pending();
        let commands = self.commands.clone();
        let delay = self.config.response_delay();
        let generation = self.generation;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = commands.send(Command::Think(generation));
        }));
    }

    /// Abort the scheduled think. A think already queued becomes stale.
    fn cancel_pending(&mut self) {
        self.generation += 1;
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }

    async fn think(&mut self) {
        let snapshot = {
            let live = lock_board(&self.board);
            if live.is_terminal() || live.next_piece() != self.piece {
                return;
            }
            live.snapshot()
        };

        info!(player = %self.name(), level = self.config.level, "thinking...");
        self.emit(PlayerSignal::ThinkStart);
        let result = self
            .engine
            .find_next_move(snapshot.clone(), self.config.level)
            .await;
        self.emit(PlayerSignal::ThinkEnd);

        match result {
            Ok(moves) => self.play(&snapshot, moves),
            Err(err) => {
                warn!(player = %self.name(), error = %err, "engine failed");
                self.emit(PlayerSignal::Failed(err));
            }
        }
    }

    /// Play the engine's answer, if the board is still where the engine saw it.
    fn play(&mut self, snapshot: &Snapshot, moves: Vec<Move>) {
        let mut live = lock_board(&self.board);

        if live.snapshot() != *snapshot {
            let retry = !live.is_terminal() && live.next_piece() == self.piece;
            drop(live);
            warn!(player = %self.name(), retry, "board changed while thinking, result discarded");
            if retry && !self.sleeping {
                self.cancel_pending();
                let _ = self.commands.send(Command::Think(self.generation));
            }
            return;
        }

        match moves.into_iter().next() {
            Some(mv) => {
                info!(player = %self.name(), x = mv.x, y = mv.y, "playing");
                mv.apply(&mut live);
                drop(live);
                self.emit(PlayerSignal::Played { x: mv.x, y: mv.y });
            }
            None => {
                if let Some(mv) = move_finder::search(&live).first() {
                    let (x, y) = mv.point();
                    drop(live);
                    let err = EngineError::Protocol(format!(
                        "engine passed while ({x}, {y}) is playable"
                    ));
                    warn!(player = %self.name(), error = %err, "pass rejected");
                    self.emit(PlayerSignal::Failed(err));
                    return;
                }
                info!(player = %self.name(), "pass :(");
                live.pass();
                drop(live);
                self.emit(PlayerSignal::Passed);
            }
        }
    }
}
