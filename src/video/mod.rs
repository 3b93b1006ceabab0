mod poller;

pub use poller::VideoPoller;
