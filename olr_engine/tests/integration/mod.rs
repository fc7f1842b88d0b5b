mod properties;
mod race_flow;
mod scheduling;
