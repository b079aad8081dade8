pub mod read_states;
