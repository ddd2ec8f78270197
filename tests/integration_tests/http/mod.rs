mod mod_gateway;
