//! Cpal output backend
//!
//! Owns the device stream on a dedicated thread: cpal streams are not
//! `Send`, so the stream is created, started, and dropped entirely on a
//! worker thread that parks until shutdown. The control side talks to the
//! real-time callback exclusively through a lock-free SPSC command queue.

use std::sync::mpsc;
use std::sync::Mutex;
use std::thread;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Consumer, Producer};

use crate::audio::mixer::{Mixer, MixerCommand, COMMAND_QUEUE_CAPACITY};
use crate::error::AudioError;

use super::{AudioBackend, ENGINE_SAMPLE_RATE};

struct Worker {
    commands: Producer<MixerCommand>,
    shutdown: mpsc::Sender<()>,
    handle: thread::JoinHandle<()>,
}

/// Output backend driving the default cpal device.
pub struct CpalBackend {
    worker: Mutex<Option<Worker>>,
}

impl CpalBackend {
    pub fn new() -> Self {
        Self {
            worker: Mutex::new(None),
        }
    }

    fn lock_worker(&self) -> Result<std::sync::MutexGuard<'_, Option<Worker>>, AudioError> {
        self.worker.lock().map_err(|_| AudioError::LockPoisoned {
            component: "audio_backend".to_string(),
        })
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for CpalBackend {
    fn activate(&self) -> Result<(), AudioError> {
        let mut guard = self.lock_worker()?;
        if guard.is_some() {
            // Already unlocked; activation is idempotent.
            return Ok(());
        }

        let (producer, consumer) = rtrb::RingBuffer::new(COMMAND_QUEUE_CAPACITY);
        let (ready_tx, ready_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("breath-audio".to_string())
            .spawn(move || run_stream(consumer, ready_tx, shutdown_rx))
            .map_err(|e| AudioError::StreamOpenFailed {
                reason: format!("Failed to spawn audio thread: {}", e),
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                *guard = Some(Worker {
                    commands: producer,
                    shutdown: shutdown_tx,
                    handle,
                });
                log::info!("[Audio] Output stream active at {} Hz", ENGINE_SAMPLE_RATE);
                Ok(())
            }
            Ok(Err(err)) => {
                let _ = handle.join();
                Err(err)
            }
            Err(_) => {
                let _ = handle.join();
                Err(AudioError::StreamOpenFailed {
                    reason: "Audio thread exited before reporting readiness".to_string(),
                })
            }
        }
    }

    fn is_active(&self) -> bool {
        self.worker
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    fn submit(&self, cmd: MixerCommand) -> Result<(), AudioError> {
        let mut guard = self.lock_worker()?;
        match guard.as_mut() {
            Some(worker) => {
                if worker.commands.push(cmd).is_err() {
                    // Queue full means the callback is not draining; dropping
                    // a cue degrades to silence, which is the contract.
                    log::warn!("[Audio] Command queue full; dropping command");
                }
                Ok(())
            }
            None => Err(AudioError::BackendInactive),
        }
    }

    fn sample_rate(&self) -> u32 {
        ENGINE_SAMPLE_RATE
    }

    fn close(&self) -> Result<(), AudioError> {
        let worker = self.lock_worker()?.take();
        if let Some(worker) = worker {
            let _ = worker.shutdown.send(());
            if worker.handle.join().is_err() {
                log::warn!("[Audio] Audio thread panicked during shutdown");
            }
            log::info!("[Audio] Output stream closed");
        }
        Ok(())
    }
}

impl Drop for CpalBackend {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Worker-thread body: open the stream, report readiness, then park until
/// shutdown so the stream stays alive on this thread.
fn run_stream(
    consumer: Consumer<MixerCommand>,
    ready_tx: mpsc::Sender<Result<(), AudioError>>,
    shutdown_rx: mpsc::Receiver<()>,
) {
    let stream = match open_output_stream(consumer) {
        Ok(stream) => stream,
        Err(err) => {
            let _ = ready_tx.send(Err(err));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(AudioError::StreamOpenFailed {
            reason: format!("Output start failed: {}", e),
        }));
        return;
    }

    let _ = ready_tx.send(Ok(()));

    // Blocks until close() sends or the sender is dropped.
    let _ = shutdown_rx.recv();
    drop(stream);
}

fn open_output_stream(mut consumer: Consumer<MixerCommand>) -> Result<cpal::Stream, AudioError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| AudioError::StreamOpenFailed {
            reason: "No default output device found".to_string(),
        })?;

    let supported = device
        .default_output_config()
        .map_err(|e| AudioError::StreamOpenFailed {
            reason: format!("Failed to get default output config: {:?}", e),
        })?;

    let channels_count = supported.channels() as usize;
    let stream_config = cpal::StreamConfig {
        channels: supported.channels(),
        sample_rate: cpal::SampleRate(ENGINE_SAMPLE_RATE),
        buffer_size: cpal::BufferSize::Default,
    };

    let err_fn = |err| eprintln!("Output stream error: {}", err);

    let mut mixer = Mixer::new();

    let stream = match supported.sample_format() {
        cpal::SampleFormat::F32 => device.build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                // Real-time callback - no allocations, locks, or blocking.
                while let Ok(cmd) = consumer.pop() {
                    mixer.apply(cmd);
                }
                mixer.render(data, channels_count);
            },
            err_fn,
            None,
        ),
        _ => {
            return Err(AudioError::StreamOpenFailed {
                reason: "Only F32 sample format is currently supported for output".to_string(),
            })
        }
    }
    .map_err(|e| AudioError::StreamOpenFailed {
        reason: format!("{:?}", e),
    })?;

    Ok(stream)
}
