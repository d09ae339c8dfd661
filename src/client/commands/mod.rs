pub mod last_race;
pub mod list_tracked;
pub mod ping;
pub mod set_channel;
pub mod test_post;
pub mod track;
pub mod untrack;
