mod mocks;
mod orders;
