mod command_case1;
mod config_case1;
mod notify_case1;
