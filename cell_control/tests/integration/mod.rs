mod end_to_end;
mod startup;
mod stations;
mod teardown;
