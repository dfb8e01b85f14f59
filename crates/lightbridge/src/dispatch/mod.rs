mod command;
mod dispatcher;
mod event;
mod mapping;
mod state;
mod topic;

pub use command::LightCommand;
pub use command::PowerState;
pub use command::command_topic;
pub use dispatcher::DispatchError;
pub use dispatcher::Dispatcher;
pub use dispatcher::IgnoreReason;
pub use dispatcher::Outcome;
pub use event::EVENT_QUEUE_CAPACITY;
pub use event::EventReceiver;
pub use event::EventSender;
pub use event::InboundEvent;
pub use event::SwitchAction;
pub use event::event_queue;
pub use event::offer_event;
pub use mapping::LightMapping;
pub use mapping::MappingTable;
pub use state::ToggleStore;
pub use topic::parse_action_topic;
