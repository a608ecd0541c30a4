pub mod events;

pub use events::EventsRepository;
