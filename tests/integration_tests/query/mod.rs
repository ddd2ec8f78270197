mod mod_find;
mod mod_scan;
