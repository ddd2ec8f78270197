mod prop_order;
