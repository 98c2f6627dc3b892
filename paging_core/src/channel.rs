pub mod channel {
    use std::collections::HashMap;
    use std::io::{Error, ErrorKind};
    use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
    use std::time::Duration;

    use crate::proc::proc::Pid;
    use crate::request::request::{MemoryRequest, MemoryResponse};

    /// Manager side of the request/response transport.
    ///
    /// Every client shares one request queue into the manager and owns a
    /// private response queue, so a response can only ever reach the
    /// process it is addressed to.
    pub struct RequestChannel {
        inbox: Receiver<MemoryRequest>,
        outbox: Sender<MemoryRequest>,
        replies: HashMap<Pid, Sender<MemoryResponse>>,
    }

    /// Client side: send requests, block for the matching response.
    pub struct ClientEndpoint {
        pid: Pid,
        requests: Sender<MemoryRequest>,
        responses: Receiver<MemoryResponse>,
    }

    impl RequestChannel {
        pub fn new() -> RequestChannel {
            let (outbox, inbox) = mpsc::channel();
            RequestChannel {
                inbox,
                outbox,
                replies: HashMap::new(),
            }
        }

        /// Register `pid` and hand back its endpoint.
        pub fn connect(&mut self, pid: Pid) -> ClientEndpoint {
            let (reply_tx, reply_rx) = mpsc::channel();
            self.replies.insert(pid, reply_tx);
            ClientEndpoint {
                pid,
                requests: self.outbox.clone(),
                responses: reply_rx,
            }
        }

        pub fn disconnect(&mut self, pid: Pid) -> bool {
            self.replies.remove(&pid).is_some()
        }

        /// Next request in receipt order, or `None` if nothing arrived
        /// within `timeout`.
        pub fn receive(&self, timeout: Duration) -> Result<Option<MemoryRequest>, Error> {
            match self.inbox.recv_timeout(timeout) {
                Ok(req) => Ok(Some(req)),
                Err(RecvTimeoutError::Timeout) => Ok(None),
                Err(RecvTimeoutError::Disconnected) => {
                    Err(Error::new(ErrorKind::BrokenPipe, "request queue disconnected"))
                }
            }
        }

        pub fn reply(&self, response: MemoryResponse) -> Result<(), Error> {
            let tx = self.replies.get(&response.target).ok_or_else(|| {
                Error::new(ErrorKind::NotConnected, format!("no endpoint for {}", response.target))
            })?;

            tx.send(response).map_err(|_| {
                Error::new(
                    ErrorKind::BrokenPipe,
                    format!("{} stopped listening", response.target),
                )
            })
        }
    }

    impl Default for RequestChannel {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ClientEndpoint {
        pub fn pid(&self) -> Pid {
            self.pid
        }

        pub fn send(&self, request: MemoryRequest) -> Result<(), Error> {
            self.requests
                .send(request)
                .map_err(|_| Error::new(ErrorKind::BrokenPipe, "manager is gone"))
        }

        /// Wait up to `timeout` for a response. Responses addressed to
        /// another pid are a routing bug and reported as `InvalidData`.
        pub fn wait_response(&self, timeout: Duration) -> Result<Option<MemoryResponse>, Error> {
            match self.responses.recv_timeout(timeout) {
                Ok(resp) if resp.target == self.pid => Ok(Some(resp)),
                Ok(resp) => Err(Error::new(
                    ErrorKind::InvalidData,
                    format!("{} received response for {}", self.pid, resp.target),
                )),
                Err(RecvTimeoutError::Timeout) => Ok(None),
                Err(RecvTimeoutError::Disconnected) => {
                    Err(Error::new(ErrorKind::BrokenPipe, "manager is gone"))
                }
            }
        }
    }

}
