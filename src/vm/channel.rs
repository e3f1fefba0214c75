#[cfg(not(feature = "tokio"))]
use crossbeam_channel::{bounded, Sender, Receiver};
#[cfg(feature = "tokio")]
use std::{future::Future, pin::Pin, task::{Context, Poll}};
use anyhow::{Error, Result};
use serde_json::Value;
#[cfg(feature = "tokio")]
use tokio::sync::oneshot::{channel, Sender, Receiver};
use super::deferred::Outcome;
use super::error::Reason;

pub struct Tx(Sender<Result<Value>>);
pub struct Rx(Receiver<Result<Value>>);

#[cfg(not(feature = "tokio"))]
fn channel() -> (Sender<Result<Value>>, Receiver<Result<Value>>) {
    bounded(1)
}

pub fn oneshot() -> (Tx, Rx) {
    let (tx, rx) = channel();
    (Tx(tx), Rx(rx))
}

impl Tx {
    pub fn send(self, outcome: Outcome) {
        let result = outcome.map_err(|reason| {
            match reason {
                Reason::Value(Value::String(s)) => Error::msg(s),
                reason                          => Error::new(reason),
            }
        });

        match self.0.send(result) {
            Ok(()) => (),
            Err(_) => (),
        }
    }
}

#[cfg(not(feature = "tokio"))]
impl Rx {
    pub fn recv(self) -> Result<Value> {
        self.0.recv()?
    }
}

#[cfg(feature = "tokio")]
impl Rx {
    pub fn recv(self) -> Result<Value> {
        self.0.blocking_recv()?
    }
}

#[cfg(feature = "tokio")]
impl Future for Rx {
    type Output = Result<Value>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.0).poll(cx) {
            Poll::Ready(Ok(r))  => Poll::Ready(r),
            Poll::Ready(Err(e)) => Poll::Ready(Err(e.into())),
            Poll::Pending       => Poll::Pending,
        }
    }
}
