// Session request methods. Must match static/autoload.js, as must the event
// names on `frames::SessionEvent`.

pub const SLIDER_SET: &str = "slider.set";
pub const PING: &str = "ping";
